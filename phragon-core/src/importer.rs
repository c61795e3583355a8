//! # Importers
//!
//! An importer asynchronously produces the module behind a loadable. It is
//! invoked at most once per load cycle by the loader entry that owns it; the
//! entry shares the result with every consumer.
//!
//! # Usage Patterns
//!
//! 1. **Direct closure**: `|| async { Ok(module) }`
//! 2. **Struct implementation**: `impl Importer<MyModule> for MyImporter`

use crate::error::BoxError;
use std::{future::Future, pin::Pin};

/// Asynchronously produces a module.
///
/// This trait uses native `async fn` for zero-cost static dispatch.
/// For dynamic dispatch (e.g., inside a loader entry), use [`DynImporter`].
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot import modules of type `{M}`",
    label = "missing `Importer<{M}>` implementation",
    note = "Importers must implement `import`, or be a closure `Fn() -> impl Future<Output = Result<{M}, BoxError>>`."
)]
pub trait Importer<M>: Send + Sync + 'static {
    /// Start the import.
    fn import(&self) -> impl Future<Output = Result<M, BoxError>> + Send;
}

// Blanket impl for closures
impl<F, Fut, M> Importer<M> for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<M, BoxError>> + Send,
{
    fn import(&self) -> impl Future<Output = Result<M, BoxError>> + Send {
        (self)()
    }
}

/// Dynamic object-safe version of [`Importer`].
pub trait DynImporter<M>: Send + Sync + 'static {
    /// Start the import (dynamic dispatch version).
    fn import_dyn<'a>(&'a self) -> Pin<Box<dyn Future<Output = Result<M, BoxError>> + Send + 'a>>;
}

// Blanket implementation: Any type implementing Importer implements DynImporter automatically.
impl<M: 'static, T: Importer<M>> DynImporter<M> for T {
    fn import_dyn<'a>(&'a self) -> Pin<Box<dyn Future<Output = Result<M, BoxError>> + Send + 'a>> {
        Box::pin(self.import())
    }
}
