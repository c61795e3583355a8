//! The `enum` modifier: `{lang:enum(en, fr, de)}`.

use super::check_arity;
use phragon_core::{MatchOutcome, Modifier, PatternError, Validator};

/// Accepts exactly one of the listed words.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnumModifier;

impl Modifier for EnumModifier {
    fn build(&self, args: &[String]) -> Result<Box<dyn Validator>, PatternError> {
        check_arity("enum", args, 1..=usize::MAX)?;
        if let Some(empty) = args.iter().position(String::is_empty) {
            return Err(PatternError::invalid_argument(
                "enum",
                format!("argument {} is empty", empty + 1),
            ));
        }
        let choices = args.to_vec();
        Ok(Box::new(move |raw: &str| {
            MatchOutcome::from(choices.iter().any(|c| c == raw))
        }))
    }
}
