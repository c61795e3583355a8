//! The `int` modifier: `{page:int}` or `{page:int(1, 100)}`.

use super::check_arity;
use phragon_core::{MatchOutcome, Modifier, PatternError, Validator, Value};

/// Accepts signed integers, optionally bounded by an inclusive range.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntModifier;

impl Modifier for IntModifier {
    fn fragment(&self) -> &str {
        "-?[0-9]+"
    }

    fn build(&self, args: &[String]) -> Result<Box<dyn Validator>, PatternError> {
        check_arity("int", args, 0..=2)?;
        let (min, max) = match args {
            [] => (i64::MIN, i64::MAX),
            [min, max] => (parse_bound(min)?, parse_bound(max)?),
            _ => {
                return Err(PatternError::ModifierArity {
                    modifier: "int".into(),
                    expected: "0 or 2".into(),
                    found: args.len(),
                });
            }
        };
        if min > max {
            return Err(PatternError::invalid_argument(
                "int",
                format!("empty range {min}..={max}"),
            ));
        }
        Ok(Box::new(IntValidator { min, max }))
    }
}

fn parse_bound(arg: &str) -> Result<i64, PatternError> {
    arg.parse()
        .map_err(|_| PatternError::invalid_argument("int", format!("`{arg}` is not an integer")))
}

struct IntValidator {
    min: i64,
    max: i64,
}

impl Validator for IntValidator {
    fn validate(&self, raw: &str) -> MatchOutcome {
        match raw.parse::<i64>() {
            Ok(n) if (self.min..=self.max).contains(&n) => {
                MatchOutcome::AcceptedValue(Value::Int(n))
            }
            _ => MatchOutcome::Rejected,
        }
    }
}
