//! # Segment Modifiers
//!
//! A modifier is a named, parameterized validator for one captured path
//! segment. Templates invoke it as `{name:modifier(arg, ...)}`.
//!
//! Building happens once, when the template is compiled: [`Modifier::build`]
//! checks the arguments and returns a [`Validator`]. Argument errors are
//! therefore configuration errors, never match-time failures.

use crate::{error::PatternError, value::Value};

/// Regex fragment used for parameters without a modifier.
pub const DEFAULT_SEGMENT: &str = "[^/]+";

/// The verdict of a [`Validator`] on one raw segment.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// The segment does not satisfy the modifier; the whole match fails.
    Rejected,
    /// The segment is accepted and kept as a string.
    AcceptedRaw,
    /// The segment is accepted and replaced by a coerced value.
    AcceptedValue(Value),
}

impl MatchOutcome {
    /// Whether the segment was accepted.
    pub fn is_accepted(&self) -> bool {
        !matches!(self, MatchOutcome::Rejected)
    }
}

impl From<bool> for MatchOutcome {
    fn from(accepted: bool) -> Self {
        if accepted {
            MatchOutcome::AcceptedRaw
        } else {
            MatchOutcome::Rejected
        }
    }
}

/// Judges captured segments for one modifier invocation.
pub trait Validator: Send + Sync {
    /// Judge a raw (percent-decoded) segment.
    fn validate(&self, raw: &str) -> MatchOutcome;

    /// Format a typed value back into a segment.
    ///
    /// Returns `None` when the value should be rendered with its `Display`
    /// implementation.
    fn format(&self, value: &Value) -> Option<String> {
        let _ = value;
        None
    }
}

// Blanket impl for closures
impl<F> Validator for F
where
    F: Fn(&str) -> MatchOutcome + Send + Sync,
{
    fn validate(&self, raw: &str) -> MatchOutcome {
        (self)(raw)
    }
}

/// A named capability that turns invocation arguments into a [`Validator`].
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a segment modifier",
    label = "missing `Modifier` implementation",
    note = "Modifiers must implement `build`, or be a closure `Fn(&[String]) -> Result<Box<dyn Validator>, PatternError>`."
)]
pub trait Modifier: Send + Sync + 'static {
    /// Regex fragment spliced into the compiled pattern for this parameter.
    fn fragment(&self) -> &str {
        DEFAULT_SEGMENT
    }

    /// Check the invocation arguments and build the validator.
    fn build(&self, args: &[String]) -> Result<Box<dyn Validator>, PatternError>;
}

// Blanket impl for closures
impl<F> Modifier for F
where
    F: Fn(&[String]) -> Result<Box<dyn Validator>, PatternError> + Send + Sync + 'static,
{
    fn build(&self, args: &[String]) -> Result<Box<dyn Validator>, PatternError> {
        (self)(args)
    }
}
