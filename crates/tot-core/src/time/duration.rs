//! Signed relative durations such as `-8h`, `5m23s` or `+1d 2h`.
//!
//! Grammar: an optional leading sign, then one or more `<integer><unit>`
//! components, optionally separated by whitespace. Units are
//! case-insensitive and accept the usual aliases (`s|sec|secs|second|seconds`,
//! `m|min|...`, `h|hr|...`, `d|day|days`, `w|week|weeks`).

use std::str::FromStr;

use chrono::Duration;
use snafu::prelude::*;

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 60 * 60;
const SECONDS_PER_DAY: i64 = 24 * 60 * 60;
const SECONDS_PER_WEEK: i64 = 7 * SECONDS_PER_DAY;

/// Errors from parsing a relative duration.
#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum ParseDurationError {
    /// The input was empty or only a sign.
    #[snafu(display("duration is empty"))]
    Empty,

    /// A component started with its unit (e.g. `h` or `-m`).
    #[snafu(display("missing number in duration '{spec}'"))]
    MissingNumber {
        /// The token that failed to parse.
        spec: String,
    },

    /// A component had a number but no unit (e.g. `5` or `5m3`).
    #[snafu(display("missing unit in duration '{spec}'"))]
    MissingUnit {
        /// The token that failed to parse.
        spec: String,
    },

    /// The numeric part did not parse.
    #[snafu(display("invalid number in duration '{spec}': {source}"))]
    InvalidNumber {
        /// The token that failed to parse.
        spec: String,
        /// The parse error returned by `i64::from_str`.
        source: std::num::ParseIntError,
    },

    /// The unit suffix is not one of the supported ones.
    #[snafu(display("unknown duration unit '{unit}' in '{spec}' (expected w|d|h|m|s)"))]
    UnknownUnit {
        /// The token that failed to parse.
        spec: String,
        /// The unrecognized unit.
        unit: String,
    },

    /// The total does not fit in a duration.
    #[snafu(display("duration '{spec}' is out of range"))]
    Overflow {
        /// The token that failed to parse.
        spec: String,
    },
}

/// A signed span of time parsed from user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelativeDuration(Duration);

impl RelativeDuration {
    /// Parse a relative duration spec; see the module docs for the grammar.
    ///
    /// # Errors
    /// Returns [`ParseDurationError`] when the spec does not match the grammar
    /// or its total overflows.
    pub fn parse(spec: &str) -> Result<Self, ParseDurationError> {
        spec.parse()
    }

    /// The parsed span.
    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl FromStr for RelativeDuration {
    type Err = ParseDurationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let spec = input.trim();

        let (negative, body) = match spec.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, spec.strip_prefix('+').unwrap_or(spec)),
        };

        let mut rest = body.trim_start();
        if rest.is_empty() {
            return Err(ParseDurationError::Empty);
        }

        let mut total: i64 = 0;
        while !rest.is_empty() {
            let num_len = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            if num_len == 0 {
                return Err(ParseDurationError::MissingNumber {
                    spec: spec.to_string(),
                });
            }
            let (num_str, after_num) = rest.split_at(num_len);

            let after_num = after_num.trim_start();
            let unit_len = after_num
                .find(|c: char| !c.is_ascii_alphabetic())
                .unwrap_or(after_num.len());
            if unit_len == 0 {
                return Err(ParseDurationError::MissingUnit {
                    spec: spec.to_string(),
                });
            }
            let (unit_str, after_unit) = after_num.split_at(unit_len);

            let value: i64 = num_str
                .parse()
                .map_err(|source| ParseDurationError::InvalidNumber {
                    spec: spec.to_string(),
                    source,
                })?;

            let unit_secs = unit_seconds(unit_str).ok_or_else(|| {
                ParseDurationError::UnknownUnit {
                    spec: spec.to_string(),
                    unit: unit_str.to_string(),
                }
            })?;

            total = value
                .checked_mul(unit_secs)
                .and_then(|secs| total.checked_add(secs))
                .ok_or_else(|| ParseDurationError::Overflow {
                    spec: spec.to_string(),
                })?;

            rest = after_unit.trim_start();
        }

        let signed = if negative { -total } else { total };

        Duration::try_seconds(signed)
            .map(RelativeDuration)
            .ok_or_else(|| ParseDurationError::Overflow {
                spec: spec.to_string(),
            })
    }
}

fn unit_seconds(unit: &str) -> Option<i64> {
    match unit.to_ascii_lowercase().as_str() {
        "s" | "sec" | "secs" | "second" | "seconds" => Some(1),
        "m" | "min" | "mins" | "minute" | "minutes" => Some(SECONDS_PER_MINUTE),
        "h" | "hr" | "hrs" | "hour" | "hours" => Some(SECONDS_PER_HOUR),
        "d" | "day" | "days" => Some(SECONDS_PER_DAY),
        "w" | "week" | "weeks" => Some(SECONDS_PER_WEEK),
        _ => None,
    }
}
