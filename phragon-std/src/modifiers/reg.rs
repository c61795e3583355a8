//! The `reg` modifier: `{id:reg([0-9]+)}`.

use super::check_arity;
use phragon_core::{MatchOutcome, Modifier, PatternError, Validator, Value};
use regex::Regex;

/// Accepts segments matching a user regex in full.
///
/// When the user regex has capture groups the value becomes
/// [`Value::Captures`] (whole segment first), otherwise the raw segment is kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegModifier;

impl Modifier for RegModifier {
    fn build(&self, args: &[String]) -> Result<Box<dyn Validator>, PatternError> {
        check_arity("reg", args, 1..=1)?;
        let regex = Regex::new(&format!("^(?:{})$", args[0]))
            .map_err(|e| PatternError::invalid_argument("reg", e.to_string()))?;
        Ok(Box::new(RegValidator { regex }))
    }
}

struct RegValidator {
    regex: Regex,
}

impl Validator for RegValidator {
    fn validate(&self, raw: &str) -> MatchOutcome {
        let Some(captures) = self.regex.captures(raw) else {
            return MatchOutcome::Rejected;
        };
        if captures.len() == 1 {
            return MatchOutcome::AcceptedRaw;
        }
        let groups = captures
            .iter()
            .map(|m| m.map(|m| m.as_str().to_string()))
            .collect();
        MatchOutcome::AcceptedValue(Value::Captures(groups))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(arg: &str) -> Box<dyn Validator> {
        RegModifier.build(&[arg.to_string()]).unwrap()
    }

    #[test]
    fn test_plain_regex() {
        let validator = build("[0-9]+");
        assert_eq!(validator.validate("42"), MatchOutcome::AcceptedRaw);
        assert_eq!(validator.validate("abc"), MatchOutcome::Rejected);
        // anchored on both ends
        assert_eq!(validator.validate("42x"), MatchOutcome::Rejected);
    }

    #[test]
    fn test_alternation_is_anchored_as_a_whole() {
        let validator = build("a|b");
        assert_eq!(validator.validate("a"), MatchOutcome::AcceptedRaw);
        assert_eq!(validator.validate("ab"), MatchOutcome::Rejected);
    }

    #[test]
    fn test_capture_groups() {
        let validator = build("([a-z]+)-([0-9]+)");
        assert_eq!(
            validator.validate("post-12"),
            MatchOutcome::AcceptedValue(Value::Captures(vec![
                Some("post-12".into()),
                Some("post".into()),
                Some("12".into()),
            ]))
        );
    }

    #[test]
    fn test_arity() {
        assert!(matches!(
            RegModifier.build(&[]),
            Err(PatternError::ModifierArity { found: 0, .. })
        ));
        assert!(matches!(
            RegModifier.build(&["a".into(), "b".into()]),
            Err(PatternError::ModifierArity { found: 2, .. })
        ));
    }

    #[test]
    fn test_invalid_regex() {
        assert!(matches!(
            RegModifier.build(&["(".into()]),
            Err(PatternError::InvalidArgument { .. })
        ));
    }
}
