//! Interval text codec.
//!
//! Converts between a number of seconds and the `"1d 2h 3m 4s"` form shown in
//! the interval inputs, and filters text while it is being typed.

use std::sync::OnceLock;

use regex::Regex;

/// Seconds in one day.
pub const DAY: u64 = 60 * 60 * 24;
/// Seconds in one hour.
pub const HOUR: u64 = 60 * 60;
/// Seconds in one minute.
pub const MINUTE: u64 = 60;

/// Largest value an interval input accepts (just under seven days).
pub const MAX_INTERVAL_SECS: u64 = 7 * DAY - 1;

/// Interval used when nothing has been configured yet.
pub const DEFAULT_INTERVAL_SECS: u64 = 900;

/// Units from largest to smallest.
const UNITS: [(char, u64); 4] = [('d', DAY), ('h', HOUR), ('m', MINUTE), ('s', 1)];

/// Render `seconds` as space-separated unit tokens.
///
/// Starts at the largest nonzero unit and always runs down to seconds, so
/// `86401` becomes `"1d 0h 0m 1s"` while `59` stays `"59s"`.
pub fn encode(seconds: u64) -> String {
    let mut remaining = seconds;
    let mut tokens: Vec<String> = Vec::with_capacity(UNITS.len());

    for (letter, size) in UNITS {
        if remaining >= size {
            tokens.push(format!("{}{letter}", remaining / size));
            remaining %= size;
        } else if !tokens.is_empty() {
            tokens.push(format!("0{letter}"));
        }
    }

    if tokens.is_empty() {
        return "0s".to_string();
    }
    tokens.join(" ")
}

fn unit_patterns() -> &'static [(Regex, u64); 4] {
    static PATTERNS: OnceLock<[(Regex, u64); 4]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        UNITS.map(|(letter, size)| {
            let re = Regex::new(&format!(r"([0-9]+)\s*{letter}")).expect("unit pattern is valid");
            (re, size)
        })
    })
}

/// Parse interval text back into seconds.
///
/// Each unit is searched for independently and only its first occurrence
/// counts, so `"1h 2h"` is one hour. Unrecognised text contributes nothing.
pub fn decode(text: &str) -> u64 {
    unit_patterns()
        .iter()
        .filter_map(|(re, size)| {
            let caps = re.captures(text)?;
            // Digit runs beyond u64 saturate rather than fail.
            let count = caps[1].parse::<u64>().unwrap_or(u64::MAX);
            Some(count.saturating_mul(*size))
        })
        .fold(0u64, |acc, secs| acc.saturating_add(secs))
}

/// Outcome of filtering partially typed interval text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    /// Complete, well-formed text.
    Acceptable,
    /// Could still become well-formed (empty, or digits awaiting a unit).
    Intermediate,
    /// Can never become well-formed by appending.
    Invalid,
}

impl Validation {
    /// Whether the keystroke producing this text should be let through.
    pub fn is_accepted(self) -> bool {
        !matches!(self, Validation::Invalid)
    }
}

#[derive(Clone, Copy)]
enum Scan {
    ExpectDigit,
    Digits,
    AwaitUnit,
    AfterUnit,
}

fn is_unit(c: char) -> bool {
    UNITS.iter().any(|(letter, _)| *letter == c)
}

/// Live input filter for interval text.
///
/// Text is acceptable when it fully matches `(\d+\s*[dhms]\s*)+`; a prefix
/// of such text is intermediate. The cursor is handed back clamped to the
/// text length.
pub fn validate_partial(text: &str, cursor: usize) -> (Validation, usize) {
    let cursor = cursor.min(text.chars().count());
    let mut state = Scan::ExpectDigit;

    for c in text.chars() {
        state = match (state, c) {
            (Scan::ExpectDigit | Scan::Digits | Scan::AfterUnit, d) if d.is_ascii_digit() => Scan::Digits,
            (Scan::Digits | Scan::AwaitUnit, w) if w.is_whitespace() => Scan::AwaitUnit,
            (Scan::Digits | Scan::AwaitUnit, u) if is_unit(u) => Scan::AfterUnit,
            (Scan::AfterUnit, w) if w.is_whitespace() => Scan::AfterUnit,
            _ => return (Validation::Invalid, cursor),
        };
    }

    let verdict = match state {
        Scan::AfterUnit => Validation::Acceptable,
        Scan::ExpectDigit | Scan::Digits | Scan::AwaitUnit => Validation::Intermediate,
    };
    (verdict, cursor)
}

/// Seconds-valued input control bounded to [`MAX_INTERVAL_SECS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalInput {
    value: u64,
}

impl Default for IntervalInput {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL_SECS)
    }
}

impl IntervalInput {
    pub fn new(seconds: u64) -> Self {
        Self {
            value: seconds.min(MAX_INTERVAL_SECS),
        }
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    /// Set the value, clamping anything at or past seven days.
    pub fn set_value(&mut self, seconds: u64) {
        self.value = seconds.min(MAX_INTERVAL_SECS);
    }

    /// Replace the value from typed text and return the clamped result.
    pub fn set_text(&mut self, text: &str) -> u64 {
        self.set_value(decode(text));
        self.value
    }

    pub fn text(&self) -> String {
        encode(self.value)
    }

    pub fn validate(&self, text: &str, cursor: usize) -> (Validation, usize) {
        validate_partial(text, cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn encode_zero_is_seconds_token() {
        assert_eq!(encode(0), "0s");
        assert_eq!(decode("0s"), 0);
    }

    #[test]
    fn encode_boundaries() {
        assert_eq!(encode(59), "59s");
        assert_eq!(encode(60), "1m 0s");
        assert_eq!(encode(3661), "1h 1m 1s");
        assert_eq!(encode(86400), "1d 0h 0m 0s");
        assert_eq!(encode(86401), "1d 0h 0m 1s");
        assert_eq!(encode(MAX_INTERVAL_SECS), "6d 23h 59m 59s");
    }

    #[test]
    fn decode_accepts_any_order_and_spacing() {
        assert_eq!(decode("1d2h"), DAY + 2 * HOUR);
        assert_eq!(decode("4s 3m"), 3 * MINUTE + 4);
        assert_eq!(decode("15 m"), 15 * MINUTE);
    }

    #[test]
    fn decode_first_occurrence_of_unit_wins() {
        assert_eq!(decode("1h 2h"), 3600);
        assert_eq!(decode("2m 1h 5m"), HOUR + 2 * MINUTE);
    }

    #[test]
    fn decode_ignores_unrecognised_text() {
        assert_eq!(decode(""), 0);
        assert_eq!(decode("soon"), 0);
        assert_eq!(decode("5x"), 0);
        assert_eq!(decode("5H"), 0);
    }

    #[test]
    fn decode_saturates_huge_counts() {
        assert_eq!(decode("99999999999999999999999d"), u64::MAX);
    }

    #[test]
    fn validate_complete_text() {
        assert_eq!(validate_partial("1d2h", 4).0, Validation::Acceptable);
        assert_eq!(validate_partial("1d 2h 3m 4s ", 0).0, Validation::Acceptable);
        assert_eq!(validate_partial("10 m", 0).0, Validation::Acceptable);
    }

    #[test]
    fn validate_in_progress_text() {
        assert_eq!(validate_partial("", 0).0, Validation::Intermediate);
        assert_eq!(validate_partial("1d 2", 0).0, Validation::Intermediate);
        assert_eq!(validate_partial("12 ", 0).0, Validation::Intermediate);
        assert!(validate_partial("1d 2", 0).0.is_accepted());
    }

    #[test]
    fn validate_rejects_malformed_text() {
        assert_eq!(validate_partial("1x", 0).0, Validation::Invalid);
        assert_eq!(validate_partial("d", 0).0, Validation::Invalid);
        assert_eq!(validate_partial("1dh", 0).0, Validation::Invalid);
        assert_eq!(validate_partial(" 1d", 0).0, Validation::Invalid);
        assert_eq!(validate_partial("1 2d", 0).0, Validation::Invalid);
        assert_eq!(validate_partial("1D", 0).0, Validation::Invalid);
        assert!(!validate_partial("1x", 0).0.is_accepted());
    }

    #[test]
    fn validate_clamps_cursor() {
        assert_eq!(validate_partial("1d", 10).1, 2);
        assert_eq!(validate_partial("1d", 1).1, 1);
    }

    #[test]
    fn interval_input_clamps_to_seven_days() {
        let mut input = IntervalInput::default();
        assert_eq!(input.value(), 900);
        assert_eq!(input.text(), "15m 0s");

        assert_eq!(input.set_text("7d"), MAX_INTERVAL_SECS);
        input.set_value(10 * DAY);
        assert_eq!(input.value(), MAX_INTERVAL_SECS);
        assert_eq!(input.set_text("1h 30m"), 5400);
    }

    proptest! {
        #[test]
        fn roundtrip_within_a_week(secs in 0u64..7 * DAY) {
            prop_assert_eq!(decode(&encode(secs)), secs);
        }
    }
}
