//! # phragon-std
//!
//! Standard implementations for the Phragon framework.
//!
//! This crate provides:
//! - **Modifiers**: [`ModifierRegistry`] with the built-in `reg`, `date`, `int` and `enum`
//! - **Pattern compilation**: [`Pattern`], [`PatternCache`]
//! - **URL building**: [`UrlPattern`], [`UrlOptions`], [`build_query`]
//! - **Loadables**: [`LoadableRegistry`], [`LoaderEntry`], [`Observer`]
//! - **Testing utilities**: [`testing`]
//!
//! [`ModifierRegistry`]: modifiers::ModifierRegistry
//! [`Pattern`]: pattern::Pattern
//! [`PatternCache`]: pattern::PatternCache
//! [`UrlPattern`]: url::UrlPattern
//! [`UrlOptions`]: url::UrlOptions
//! [`build_query`]: url::build_query
//! [`LoadableRegistry`]: loadable::LoadableRegistry
//! [`LoaderEntry`]: loadable::LoaderEntry
//! [`Observer`]: loadable::Observer

#![deny(clippy::pub_use, clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use phragon_core;

// Modules
pub mod loadable;
pub mod modifiers;
pub mod pattern;
pub mod testing;
pub mod url;
