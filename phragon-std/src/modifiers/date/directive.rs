//! Date format directives.
//!
//! Each directive contributes a regex fragment, a range check applied to the
//! captured text, and a writer used when formatting a date back into a segment.

use chrono::{DateTime, Datelike, FixedOffset, Timelike};
use std::fmt::Write;

/// One format directive character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// `d` - day of month, two digits, 01-31.
    Day,
    /// `j` - day of month without leading zero, 1-31.
    DayShort,
    /// `m` - month, two digits, 01-12.
    Month,
    /// `n` - month without leading zero, 1-12.
    MonthShort,
    /// `Y` - four digit year.
    Year,
    /// `y` - two digit year; 70-99 map to 19xx, 00-69 to 20xx.
    YearShort,
    /// `a` - `am` or `pm`.
    Meridiem,
    /// `A` - `AM` or `PM`.
    MeridiemUpper,
    /// `g` - 12-hour clock without leading zero, 1-12.
    Hour12Short,
    /// `G` - 24-hour clock without leading zero, 0-23.
    Hour24Short,
    /// `h` - 12-hour clock, two digits, 01-12.
    Hour12,
    /// `H` - 24-hour clock, two digits, 00-23.
    Hour24,
    /// `i` - minutes, 00-59.
    Minute,
    /// `s` - seconds, 00-59.
    Second,
    /// `u` - microseconds, six digits.
    Micros,
    /// `v` - milliseconds, three digits.
    Millis,
    /// `O` - UTC offset without colon, e.g. `+0200`.
    Offset,
    /// `P` - UTC offset with colon, e.g. `+02:00`.
    OffsetColon,
}

/// Directive lookup by format character.
pub static DIRECTIVES: phf::Map<char, Directive> = phf::phf_map! {
    'd' => Directive::Day,
    'j' => Directive::DayShort,
    'm' => Directive::Month,
    'n' => Directive::MonthShort,
    'Y' => Directive::Year,
    'y' => Directive::YearShort,
    'a' => Directive::Meridiem,
    'A' => Directive::MeridiemUpper,
    'g' => Directive::Hour12Short,
    'G' => Directive::Hour24Short,
    'h' => Directive::Hour12,
    'H' => Directive::Hour24,
    'i' => Directive::Minute,
    's' => Directive::Second,
    'u' => Directive::Micros,
    'v' => Directive::Millis,
    'O' => Directive::Offset,
    'P' => Directive::OffsetColon,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Meridiem {
    Am,
    Pm,
}

/// Calendar fields collected while validating a segment.
#[derive(Debug, Default)]
pub(super) struct Fields {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub hour24: Option<u32>,
    pub hour12: Option<u32>,
    pub meridiem: Option<Meridiem>,
    pub minute: Option<u32>,
    pub second: Option<u32>,
    pub micros: Option<u32>,
    pub offset: Option<i32>,
}

impl Fields {
    /// The hour on a 24-hour clock, folding a 12-hour value with its meridiem.
    pub fn hour(&self) -> u32 {
        if let Some(hour) = self.hour24 {
            return hour;
        }
        match (self.hour12, self.meridiem) {
            (Some(12), Some(Meridiem::Am)) => 0,
            (Some(h), Some(Meridiem::Pm)) if h < 12 => h + 12,
            (Some(h), _) => h,
            (None, _) => 0,
        }
    }
}

impl Directive {
    /// Regex fragment matching this directive (without a capture group).
    pub fn fragment(self) -> &'static str {
        match self {
            Directive::Day
            | Directive::Month
            | Directive::YearShort
            | Directive::Hour12
            | Directive::Hour24
            | Directive::Minute
            | Directive::Second => "[0-9]{2}",
            Directive::DayShort
            | Directive::MonthShort
            | Directive::Hour12Short
            | Directive::Hour24Short => "[0-9]{1,2}",
            Directive::Year => "[0-9]{4}",
            Directive::Meridiem => "am|pm",
            Directive::MeridiemUpper => "AM|PM",
            Directive::Micros => "[0-9]{6}",
            Directive::Millis => "[0-9]{3}",
            Directive::Offset => "[+-][0-9]{4}",
            Directive::OffsetColon => "[+-][0-9]{2}:[0-9]{2}",
        }
    }

    /// Range-check the captured text and record it. Returns `false` when the
    /// value is out of range.
    pub(super) fn apply(self, text: &str, fields: &mut Fields) -> bool {
        match self {
            Directive::Day | Directive::DayShort => store(text, 1..=31, &mut fields.day),
            Directive::Month | Directive::MonthShort => store(text, 1..=12, &mut fields.month),
            Directive::Year => match text.parse() {
                Ok(year) => {
                    fields.year = Some(year);
                    true
                }
                Err(_) => false,
            },
            Directive::YearShort => match text.parse::<i32>() {
                Ok(short) => {
                    fields.year = Some(if short >= 70 { 1900 + short } else { 2000 + short });
                    true
                }
                Err(_) => false,
            },
            Directive::Meridiem | Directive::MeridiemUpper => {
                fields.meridiem = match text {
                    "am" | "AM" => Some(Meridiem::Am),
                    "pm" | "PM" => Some(Meridiem::Pm),
                    _ => return false,
                };
                true
            }
            Directive::Hour12 | Directive::Hour12Short => {
                store(text, 1..=12, &mut fields.hour12)
            }
            Directive::Hour24 | Directive::Hour24Short => {
                store(text, 0..=23, &mut fields.hour24)
            }
            Directive::Minute => store(text, 0..=59, &mut fields.minute),
            Directive::Second => store(text, 0..=59, &mut fields.second),
            Directive::Micros => store(text, 0..=999_999, &mut fields.micros),
            Directive::Millis => {
                let mut millis = None;
                let ok = store(text, 0..=999, &mut millis);
                fields.micros = millis.map(|ms| ms * 1000);
                ok
            }
            Directive::Offset | Directive::OffsetColon => match parse_offset(text) {
                Some(secs) => {
                    fields.offset = Some(secs);
                    true
                }
                None => false,
            },
        }
    }

    /// Write the directive's rendering of `date`.
    pub fn write(self, date: &DateTime<FixedOffset>, out: &mut String) {
        let hour12 = match date.hour() % 12 {
            0 => 12,
            h => h,
        };
        // Writing into a String cannot fail.
        let _ = match self {
            Directive::Day => write!(out, "{:02}", date.day()),
            Directive::DayShort => write!(out, "{}", date.day()),
            Directive::Month => write!(out, "{:02}", date.month()),
            Directive::MonthShort => write!(out, "{}", date.month()),
            Directive::Year => write!(out, "{:04}", date.year()),
            Directive::YearShort => write!(out, "{:02}", date.year().rem_euclid(100)),
            Directive::Meridiem => out.write_str(if date.hour() < 12 { "am" } else { "pm" }),
            Directive::MeridiemUpper => out.write_str(if date.hour() < 12 { "AM" } else { "PM" }),
            Directive::Hour12Short => write!(out, "{hour12}"),
            Directive::Hour24Short => write!(out, "{}", date.hour()),
            Directive::Hour12 => write!(out, "{hour12:02}"),
            Directive::Hour24 => write!(out, "{:02}", date.hour()),
            Directive::Minute => write!(out, "{:02}", date.minute()),
            Directive::Second => write!(out, "{:02}", date.second()),
            Directive::Micros => write!(out, "{:06}", date.nanosecond() / 1_000 % 1_000_000),
            Directive::Millis => write!(out, "{:03}", date.nanosecond() / 1_000_000 % 1_000),
            Directive::Offset | Directive::OffsetColon => {
                let secs = date.offset().local_minus_utc();
                let sign = if secs < 0 { '-' } else { '+' };
                let (hours, minutes) = (secs.abs() / 3600, secs.abs() % 3600 / 60);
                if self == Directive::Offset {
                    write!(out, "{sign}{hours:02}{minutes:02}")
                } else {
                    write!(out, "{sign}{hours:02}:{minutes:02}")
                }
            }
        };
    }
}

fn store(text: &str, range: std::ops::RangeInclusive<u32>, slot: &mut Option<u32>) -> bool {
    match text.parse::<u32>() {
        Ok(value) if range.contains(&value) => {
            *slot = Some(value);
            true
        }
        _ => false,
    }
}

/// Parse `+HH:MM`, `+HHMM` (or the `-` forms) into seconds east of UTC.
pub(crate) fn parse_offset(text: &str) -> Option<i32> {
    let (sign, rest) = match text.as_bytes().first()? {
        b'+' => (1, &text[1..]),
        b'-' => (-1, &text[1..]),
        _ => return None,
    };
    if !rest.is_ascii() {
        return None;
    }
    let (hours, minutes) = match rest.len() {
        4 => (&rest[..2], &rest[2..]),
        5 if rest.as_bytes()[2] == b':' => (&rest[..2], &rest[3..]),
        _ => return None,
    };
    if !hours.bytes().chain(minutes.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(sign * (hours * 3600 + minutes * 60))
}
