//! Error types for Phragon.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`PhragonError`] - Top-level error type for all Phragon operations
//! - [`PatternError`] - Errors raised while compiling a template
//! - [`BuildError`] - Errors raised while generating a URL
//! - [`LoadError`] - Errors surfaced by a loader entry

use std::{sync::Arc, time::Duration};
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all Phragon operations.
#[derive(Error, Debug)]
pub enum PhragonError {
    /// A template failed to compile.
    #[error("pattern error: {0}")]
    Pattern(#[from] PatternError),

    /// A URL could not be generated.
    #[error("build error: {0}")]
    Build(#[from] BuildError),

    /// A loadable failed to load.
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    /// A custom error occurred.
    #[error(transparent)]
    Custom(BoxError),
}

/// Errors raised while compiling a path template.
///
/// These are configuration errors: they surface when a route or pattern is
/// registered, never while matching.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// The template is malformed.
    #[error("invalid template `{template}` at {position}: {message}")]
    Syntax {
        /// The offending template.
        template: String,
        /// Character offset of the problem.
        position: usize,
        /// What went wrong.
        message: String,
    },

    /// A placeholder names a modifier that is not registered.
    #[error("unknown modifier: {0}")]
    UnknownModifier(String),

    /// A modifier was invoked with the wrong number of arguments.
    #[error("modifier `{modifier}` expects {expected} argument(s), got {found}")]
    ModifierArity {
        /// Modifier name.
        modifier: String,
        /// Human readable expectation, e.g. `1` or `1..=2`.
        expected: String,
        /// Number of arguments supplied.
        found: usize,
    },

    /// A modifier argument has an invalid value.
    #[error("invalid argument for modifier `{modifier}`: {message}")]
    InvalidArgument {
        /// Modifier name.
        modifier: String,
        /// What went wrong.
        message: String,
    },

    /// A date format contains a character that is neither a directive nor a separator.
    #[error("unknown date format directive: {0:?}")]
    UnknownDirective(char),

    /// A format or template ends with a lone backslash.
    #[error("unterminated escape sequence")]
    UnterminatedEscape,

    /// The same parameter name occurs twice in one template.
    #[error("duplicate parameter: {0}")]
    DuplicateParam(String),

    /// The same route name occurs twice in one route table.
    #[error("duplicate route: {0}")]
    DuplicateRoute(String),

    /// The generated regular expression was rejected.
    #[error("invalid regular expression: {0}")]
    Regex(String),
}

impl PatternError {
    /// Shorthand for a [`PatternError::Syntax`].
    pub fn syntax(template: &str, position: usize, message: impl Into<String>) -> Self {
        PatternError::Syntax {
            template: template.to_string(),
            position,
            message: message.into(),
        }
    }

    /// Shorthand for a [`PatternError::InvalidArgument`].
    pub fn invalid_argument(modifier: &str, message: impl Into<String>) -> Self {
        PatternError::InvalidArgument {
            modifier: modifier.to_string(),
            message: message.into(),
        }
    }
}

/// Errors raised while generating a URL from a pattern.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// A required parameter was not supplied.
    #[error("missing required parameter: {0}")]
    MissingParam(String),

    /// No pattern is registered under the given route name.
    #[error("no pattern registered for route: {0}")]
    UnknownRoute(String),

    /// An ad hoc pattern failed to compile.
    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// Errors surfaced by a loader entry to its consumers.
///
/// Cloneable because one settled import is observed by every consumer of the
/// entry.
#[derive(Error, Debug, Clone)]
pub enum LoadError {
    /// The consumer gave up waiting. The import itself keeps running.
    #[error("loading timed out after {0:?}")]
    Timeout(Duration),

    /// The importer failed.
    #[error("import failed: {0}")]
    Import(#[source] Arc<dyn std::error::Error + Send + Sync + 'static>),
}

impl LoadError {
    /// Wrap an importer failure.
    pub fn import(err: BoxError) -> Self {
        LoadError::Import(Arc::from(err))
    }

    /// Whether this error is a [`LoadError::Timeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, LoadError::Timeout(_))
    }
}

// Convenience conversions
impl From<BoxError> for PhragonError {
    fn from(err: BoxError) -> Self {
        PhragonError::Custom(err)
    }
}

impl From<BoxError> for LoadError {
    fn from(err: BoxError) -> Self {
        LoadError::import(err)
    }
}
