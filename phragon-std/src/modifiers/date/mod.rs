//! The `date` modifier: `{day:date(Y-m-d)}`, `{at:date(c)}`, `{ts:date(U)}`.
//!
//! The first argument is a format string built from [`directive`]s, or one of
//! the special forms `c` (ISO 8601) and `U` (signed Unix seconds). The optional
//! second argument is a `+HH:MM` offset applied when the format has no offset
//! directive of its own.
//!
//! Matched segments become [`Value::Date`]; when generating a path, date values
//! are formatted back with the same format.

pub mod directive;
mod format;

pub use format::DateFormat;

use super::check_arity;
use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat, TimeZone};
use directive::parse_offset;
use phragon_core::{MatchOutcome, Modifier, PatternError, Validator, Value};

/// Validates and coerces date segments.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateModifier;

impl Modifier for DateModifier {
    fn build(&self, args: &[String]) -> Result<Box<dyn Validator>, PatternError> {
        check_arity("date", args, 1..=2)?;
        let offset = match args.get(1) {
            Some(arg) => parse_offset(arg).ok_or_else(|| {
                PatternError::invalid_argument("date", format!("`{arg}` is not a +HH:MM offset"))
            })?,
            None => 0,
        };
        let kind = match args[0].as_str() {
            "c" => DateKind::Iso,
            "U" => DateKind::Unix,
            format => DateKind::Format(DateFormat::parse(format)?),
        };
        Ok(Box::new(DateValidator { kind, offset }))
    }
}

#[derive(Debug)]
enum DateKind {
    Iso,
    Unix,
    Format(DateFormat),
}

#[derive(Debug)]
struct DateValidator {
    kind: DateKind,
    /// Seconds east of UTC.
    offset: i32,
}

impl DateValidator {
    fn parse(&self, raw: &str) -> Option<DateTime<FixedOffset>> {
        match &self.kind {
            DateKind::Iso => DateTime::parse_from_rfc3339(raw).ok().or_else(|| {
                let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
                FixedOffset::east_opt(self.offset)?
                    .from_local_datetime(&naive)
                    .single()
            }),
            DateKind::Unix => {
                let digits = raw.strip_prefix('-').unwrap_or(raw);
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                let secs: i64 = raw.parse().ok()?;
                let offset = FixedOffset::east_opt(self.offset)?;
                Some(DateTime::from_timestamp(secs, 0)?.with_timezone(&offset))
            }
            DateKind::Format(format) => format.parse_date(raw, self.offset),
        }
    }
}

impl Validator for DateValidator {
    fn validate(&self, raw: &str) -> MatchOutcome {
        match self.parse(raw) {
            Some(date) => MatchOutcome::AcceptedValue(Value::Date(date)),
            None => MatchOutcome::Rejected,
        }
    }

    fn format(&self, value: &Value) -> Option<String> {
        let date = value.as_date()?;
        Some(match &self.kind {
            DateKind::Iso => date.to_rfc3339_opts(SecondsFormat::AutoSi, false),
            DateKind::Unix => date.timestamp().to_string(),
            DateKind::Format(format) => format.format(date, self.offset),
        })
    }
}
