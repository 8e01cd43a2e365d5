//! Time tokens and the stored timestamp format.
//!
//! Users name times loosely: `2020-10-04 3pm`, `8pm`, `-45m`. [`resolve`]
//! turns such a token into an absolute local timestamp relative to a given
//! "now":
//!
//! 1. An empty token means `now`.
//! 2. Absolute tokens are tried first. A time of day without a date means
//!    its most recent occurrence not later than `now`: if `now`'s time of
//!    day is earlier than the given time, yesterday; otherwise today.
//! 3. A date, or a date with a time, is returned as-is.
//! 4. Otherwise the token is read as a signed relative duration and added
//!    to `now`.
//! 5. Anything else is `UnrecognizedTime`.
//!
//! Stored timestamps always use [`TIMESTAMP_FORMAT`], which sorts
//! lexically and round-trips at second precision.

mod absolute;
mod duration;

pub use absolute::{Absolute, parse_absolute};
pub use duration::{ParseDurationError, RelativeDuration};

use chrono::{Datelike, Days, NaiveDateTime, NaiveTime};
use log::debug;
use snafu::{OptionExt, ensure};

use crate::error::{TotResult, UnrecognizedTimeSnafu};

/// `YYYY-MM-DDTHH:MM:SS`, local time, no offset.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const TIMESTAMP_LEN: usize = "YYYY-MM-DDTHH:MM:SS".len();

/// Format a timestamp for storage, dropping any fractional seconds.
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Strictly parse a stored timestamp. Anything but the exact
/// [`TIMESTAMP_FORMAT`] shape yields `None`.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    if s.len() != TIMESTAMP_LEN {
        return None;
    }
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).ok()
}

/// Whether `ts` fits [`TIMESTAMP_FORMAT`], i.e. has a four-digit year.
///
/// chrono renders other years with a sign and extra digits, which
/// [`parse_timestamp`] rejects.
pub fn is_storable(ts: NaiveDateTime) -> bool {
    (0..=9999).contains(&ts.year())
}

/// How a token was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeKind {
    /// Empty token; the timestamp is `now`.
    Now,
    /// A calendar date with no time of day (midnight).
    Date,
    /// An explicit date and time of day.
    DateTime,
    /// A time of day placed on today or yesterday.
    TimeOfDay,
    /// `now` shifted by a relative duration.
    Relative,
}

/// A resolved token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// The absolute timestamp.
    pub timestamp: NaiveDateTime,
    /// How the token was read.
    pub kind: TimeKind,
}

impl Resolution {
    /// True when the token named a whole calendar day.
    pub fn is_whole_day(&self) -> bool {
        self.kind == TimeKind::Date
    }
}

/// Resolve `token` to an absolute timestamp relative to `now`.
///
/// # Errors
/// `UnrecognizedTime` if the token is neither absolute nor a relative
/// duration, or if the result falls outside years 0000 to 9999.
pub fn resolve(token: &str, now: NaiveDateTime) -> TotResult<NaiveDateTime> {
    resolve_detailed(token, now).map(|r| r.timestamp)
}

/// Like [`resolve`], but also reports how the token was read.
pub fn resolve_detailed(token: &str, now: NaiveDateTime) -> TotResult<Resolution> {
    if token.trim().is_empty() {
        return Ok(Resolution {
            timestamp: now,
            kind: TimeKind::Now,
        });
    }

    let resolution = match parse_absolute(token) {
        Some(Absolute::Time(time)) => Resolution {
            timestamp: most_recent_occurrence(time, now).context(UnrecognizedTimeSnafu { token })?,
            kind: TimeKind::TimeOfDay,
        },
        Some(Absolute::Date(date)) => Resolution {
            timestamp: date.and_time(NaiveTime::MIN),
            kind: TimeKind::Date,
        },
        Some(Absolute::DateTime(timestamp)) => Resolution {
            timestamp,
            kind: TimeKind::DateTime,
        },
        None => {
            let offset = RelativeDuration::parse(token)
                .ok()
                .context(UnrecognizedTimeSnafu { token })?;
            Resolution {
                timestamp: now
                    .checked_add_signed(offset.as_duration())
                    .context(UnrecognizedTimeSnafu { token })?,
                kind: TimeKind::Relative,
            }
        }
    };

    ensure!(
        is_storable(resolution.timestamp),
        UnrecognizedTimeSnafu { token }
    );

    debug!(
        "resolved time token {token:?} as {:?}: {}",
        resolution.kind,
        format_timestamp(resolution.timestamp)
    );
    Ok(resolution)
}

fn most_recent_occurrence(time: NaiveTime, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let day = if now.time() < time {
        now.date().checked_sub_days(Days::new(1))?
    } else {
        now.date()
    };
    Some(day.and_time(time))
}
