//! # Loadables
//!
//! Lazily imported modules shared between any number of consumers.
//!
//! - [`LoadableRegistry`] maps names to [`LoaderEntry`]s, each wrapping one
//!   importer that runs at most once per load cycle.
//! - [`Loadable`] is the registered handle; [`Loadable::observe`] creates a
//!   per-consumer [`Observer`].
//! - [`Observer`] runs the delay/timeout/retry state machine and reports every
//!   transition to its subscribers.

mod entry;
mod observer;
mod options;
mod registry;

pub use entry::{EntryStatus, ImportFuture, LoaderEntry};
pub use observer::{LoadView, Observer, ObserverState, Phase, Subscription};
pub use options::{DEFAULT_DELAY, LoadableOptions};
pub use registry::{Loadable, LoadableRegistry};
