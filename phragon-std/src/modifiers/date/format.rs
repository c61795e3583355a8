//! Parsed date format strings.

use super::directive::{DIRECTIVES, Directive, Fields};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use phragon_core::PatternError;
use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Directive(Directive),
    Literal(char),
}

/// A format string such as `Y-m-d` or `H\hi`, compiled into a regex.
#[derive(Debug, Clone)]
pub struct DateFormat {
    pieces: Vec<Piece>,
    regex: Regex,
}

impl DateFormat {
    /// Parse a format string.
    ///
    /// `-` and `:` are literal separators, `\x` is the literal `x`, and every
    /// other character must be a directive.
    pub fn parse(format: &str) -> Result<Self, PatternError> {
        let mut pieces = Vec::new();
        let mut chars = format.chars();
        while let Some(c) = chars.next() {
            let piece = match c {
                '\\' => Piece::Literal(chars.next().ok_or(PatternError::UnterminatedEscape)?),
                '-' | ':' => Piece::Literal(c),
                _ => match DIRECTIVES.get(&c) {
                    Some(directive) => Piece::Directive(*directive),
                    None => return Err(PatternError::UnknownDirective(c)),
                },
            };
            pieces.push(piece);
        }

        let mut source = String::from("^");
        for piece in &pieces {
            match piece {
                Piece::Directive(directive) => {
                    source.push('(');
                    source.push_str(directive.fragment());
                    source.push(')');
                }
                Piece::Literal(c) => source.push_str(&regex::escape(&c.to_string())),
            }
        }
        source.push('$');
        let regex = Regex::new(&source).map_err(|e| PatternError::Regex(e.to_string()))?;

        Ok(Self { pieces, regex })
    }

    /// Whether the format carries its own UTC offset (`O` or `P`).
    pub fn has_offset(&self) -> bool {
        self.pieces.iter().any(|p| {
            matches!(
                p,
                Piece::Directive(Directive::Offset | Directive::OffsetColon)
            )
        })
    }

    /// Parse a segment. `default_offset` (seconds east of UTC) applies when
    /// the segment carries no offset of its own.
    ///
    /// Missing year defaults to the current year, missing month and day to 1,
    /// missing time fields to 0. Returns `None` when the segment does not fit
    /// the format, a field is out of range, or the calendar date does not exist.
    pub fn parse_date(&self, raw: &str, default_offset: i32) -> Option<DateTime<FixedOffset>> {
        let captures = self.regex.captures(raw)?;
        let mut fields = Fields::default();
        let directives = self.pieces.iter().filter_map(|p| match p {
            Piece::Directive(d) => Some(*d),
            Piece::Literal(_) => None,
        });
        for (index, directive) in directives.enumerate() {
            let text = captures.get(index + 1)?.as_str();
            if !directive.apply(text, &mut fields) {
                return None;
            }
        }

        let date = NaiveDate::from_ymd_opt(
            fields.year.unwrap_or_else(|| Utc::now().year()),
            fields.month.unwrap_or(1),
            fields.day.unwrap_or(1),
        )?;
        let time = NaiveTime::from_hms_micro_opt(
            fields.hour(),
            fields.minute.unwrap_or(0),
            fields.second.unwrap_or(0),
            fields.micros.unwrap_or(0),
        )?;
        let offset = FixedOffset::east_opt(fields.offset.unwrap_or(default_offset))?;
        offset.from_local_datetime(&date.and_time(time)).single()
    }

    /// Render a date with this format. Without an offset directive the date is
    /// first shifted to `default_offset`.
    pub fn format(&self, date: &DateTime<FixedOffset>, default_offset: i32) -> String {
        let shifted;
        let date = match FixedOffset::east_opt(default_offset) {
            Some(offset) if !self.has_offset() => {
                shifted = date.with_timezone(&offset);
                &shifted
            }
            _ => date,
        };

        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Directive(directive) => directive.write(date, &mut out),
                Piece::Literal(c) => out.push(*c),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(text: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(text).unwrap()
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            DateFormat::parse("Y-m-x").unwrap_err(),
            PatternError::UnknownDirective('x')
        );
        assert_eq!(
            DateFormat::parse("Y\\").unwrap_err(),
            PatternError::UnterminatedEscape
        );
        assert_eq!(
            DateFormat::parse("Y/m").unwrap_err(),
            PatternError::UnknownDirective('/')
        );
    }

    #[test]
    fn test_ymd() {
        let format = DateFormat::parse("Y-m-d").unwrap();
        assert_eq!(
            format.parse_date("2021-02-28", 0),
            Some(utc("2021-02-28T00:00:00+00:00"))
        );
        assert_eq!(format.parse_date("2021-13-01", 0), None);
        assert_eq!(format.parse_date("2021-02-30", 0), None);
        assert_eq!(format.parse_date("2021-2-28", 0), None);
    }

    #[test]
    fn test_escaped_literals() {
        let format = DateFormat::parse("Y-m-d\\TH:i").unwrap();
        assert_eq!(
            format.parse_date("2020-05-17T08:30", 0),
            Some(utc("2020-05-17T08:30:00+00:00"))
        );
        assert_eq!(
            format.format(&utc("2020-05-17T08:30:00+00:00"), 0),
            "2020-05-17T08:30"
        );
    }

    #[test]
    fn test_meridiem_time() {
        let format = DateFormat::parse("Y-m-d-g:ia").unwrap();
        assert_eq!(
            format.parse_date("2020-01-01-3:05pm", 0),
            Some(utc("2020-01-01T15:05:00+00:00"))
        );
        assert_eq!(
            format.format(&utc("2020-01-01T00:05:00+00:00"), 0),
            "2020-01-01-12:05am"
        );
    }

    #[test]
    fn test_offsets() {
        let explicit = DateFormat::parse("Y-m-d-H:iP").unwrap();
        assert!(explicit.has_offset());
        assert_eq!(
            explicit.parse_date("2020-01-01-10:00+02:00", 0),
            Some(utc("2020-01-01T08:00:00+00:00"))
        );

        let implicit = DateFormat::parse("Y-m-d-H:i").unwrap();
        assert_eq!(
            implicit.parse_date("2020-01-01-10:00", 3600),
            Some(utc("2020-01-01T09:00:00+00:00"))
        );
        assert_eq!(
            implicit.format(&utc("2020-01-01T09:00:00+00:00"), 3600),
            "2020-01-01-10:00"
        );
    }

    #[test]
    fn test_missing_year_defaults_to_current() {
        let format = DateFormat::parse("m-d").unwrap();
        let date = format.parse_date("03-04", 0).unwrap();
        assert_eq!(date.year(), Utc::now().year());
        assert_eq!((date.month(), date.day()), (3, 4));
    }

    #[test]
    fn test_fractional_seconds() {
        let format = DateFormat::parse("H:i:s-v").unwrap();
        let date = format.parse_date("10:20:30-250", 0).unwrap();
        assert_eq!(format.format(&date, 0), "10:20:30-250");
    }
}
