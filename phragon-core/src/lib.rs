//! # phragon-core
//!
//! Core traits for the Phragon path-pattern and loadable framework.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! plugins that contribute modifiers or importers without pulling in the
//! full `phragon-std` implementation.
//!
//! # Two Subsystems
//!
//! ## Path Patterns ([`Modifier`], [`Validator`])
//!
//! A path template such as `/user/{id:reg([0-9]+)}` is compiled into a matcher
//! and a generator. Each placeholder may name a modifier; the modifier turns its
//! invocation arguments into a [`Validator`], which judges every captured segment
//! and returns a [`MatchOutcome`].
//!
//! - **Two passes**: the compiled regex decides the shape, the validator decides
//!   the meaning
//! - **Coercion**: a validator may replace the raw segment with a typed [`Value`]
//! - **Reversible**: a validator may format a typed value back into a segment
//!
//! ## Loadables ([`Importer`])
//!
//! An importer produces a module asynchronously. The loader entry built around it
//! guarantees at most one import in flight, shared by every consumer.
//!
//! # Error Types
//!
//! - [`PhragonError`] - Top-level error type
//! - [`PatternError`] - Template compilation errors
//! - [`BuildError`] - URL generation errors
//! - [`LoadError`] - Import and timeout errors

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod error;
mod importer;
mod modifier;
mod value;

// Re-exports
pub use error::{BoxError, BuildError, LoadError, PatternError, PhragonError};
pub use importer::{DynImporter, Importer};
pub use modifier::{DEFAULT_SEGMENT, MatchOutcome, Modifier, Validator};
pub use value::{Params, Value};
