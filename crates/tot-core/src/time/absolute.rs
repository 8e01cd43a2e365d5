//! Absolute date and time tokens.
//!
//! Accepted shapes:
//! - dates: `YYYY-MM-DD`, `YYYY/MM/DD`, `MM/DD/YYYY`
//! - times: `H[H]:MM[:SS]` (24h) or `H[H][:MM[:SS]][ ]am|pm` (12h)
//! - a date and a time joined by `T` or whitespace
//!
//! A bare number is not a time; `5` is left for the duration grammar to
//! reject.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// What an absolute token specified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Absolute {
    /// A calendar date with no time of day.
    Date(NaiveDate),
    /// A calendar date and a time of day.
    DateTime(NaiveDateTime),
    /// A time of day with no date.
    Time(NaiveTime),
}

/// Parse `token` as an absolute date, date-time or time of day.
pub fn parse_absolute(token: &str) -> Option<Absolute> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }

    if let Some(date) = parse_date(token) {
        return Some(Absolute::Date(date));
    }

    if let Some(time) = parse_time_of_day(token) {
        return Some(Absolute::Time(time));
    }

    [token.split_once(['T', 't']), token.split_once(char::is_whitespace)]
        .into_iter()
        .flatten()
        .find_map(|(date, time)| {
            let date = parse_date(date)?;
            let time = parse_time_of_day(time)?;
            Some(Absolute::DateTime(date.and_time(time)))
        })
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s.trim(), fmt).ok())
}

#[derive(Clone, Copy)]
enum Meridiem {
    Am,
    Pm,
}

fn parse_time_of_day(s: &str) -> Option<NaiveTime> {
    let lower = s.trim().to_ascii_lowercase();

    let (clock, meridiem) = if let Some(rest) = lower.strip_suffix("am") {
        (rest.trim_end(), Some(Meridiem::Am))
    } else if let Some(rest) = lower.strip_suffix("pm") {
        (rest.trim_end(), Some(Meridiem::Pm))
    } else {
        (lower.as_str(), None)
    };

    let mut parts = clock.split(':');
    let hour = number(parts.next()?, 1..=2)?;
    let minute = parts.next().map(|p| number(p, 2..=2));
    let second = parts.next().map(|p| number(p, 2..=2));
    if parts.next().is_some() {
        return None;
    }

    // A bare hour only counts as a time when it carries am/pm.
    if minute.is_none() && meridiem.is_none() {
        return None;
    }
    let minute = minute.unwrap_or(Some(0))?;
    let second = second.unwrap_or(Some(0))?;

    let hour = match meridiem {
        None => hour,
        Some(_) if !(1..=12).contains(&hour) => return None,
        Some(Meridiem::Am) => hour % 12,
        Some(Meridiem::Pm) => hour % 12 + 12,
    };

    NaiveTime::from_hms_opt(hour, minute, second)
}

fn number(s: &str, digits: std::ops::RangeInclusive<usize>) -> Option<u32> {
    if !digits.contains(&s.len()) || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn time(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).expect("valid time")
    }

    #[test]
    fn parses_dates() {
        assert_eq!(
            parse_absolute("2020-10-06"),
            Some(Absolute::Date(date(2020, 10, 6)))
        );
        assert_eq!(
            parse_absolute("2020/10/06"),
            Some(Absolute::Date(date(2020, 10, 6)))
        );
        assert_eq!(
            parse_absolute("10/06/2020"),
            Some(Absolute::Date(date(2020, 10, 6)))
        );
    }

    #[test]
    fn parses_times_of_day() {
        assert_eq!(parse_absolute("8pm"), Some(Absolute::Time(time(20, 0, 0))));
        assert_eq!(parse_absolute("7am"), Some(Absolute::Time(time(7, 0, 0))));
        assert_eq!(parse_absolute("12am"), Some(Absolute::Time(time(0, 0, 0))));
        assert_eq!(parse_absolute("12pm"), Some(Absolute::Time(time(12, 0, 0))));
        assert_eq!(parse_absolute("3:15 PM"), Some(Absolute::Time(time(15, 15, 0))));
        assert_eq!(parse_absolute("13:05"), Some(Absolute::Time(time(13, 5, 0))));
        assert_eq!(parse_absolute("13:05:09"), Some(Absolute::Time(time(13, 5, 9))));
    }

    #[test]
    fn parses_dates_with_times() {
        let expected = date(2020, 10, 4).and_time(time(15, 0, 0));
        assert_eq!(
            parse_absolute("2020-10-04 3pm"),
            Some(Absolute::DateTime(expected))
        );
        assert_eq!(
            parse_absolute("2020-10-04T15:00:00"),
            Some(Absolute::DateTime(expected))
        );
        assert_eq!(
            parse_absolute("2020-10-04 15:00"),
            Some(Absolute::DateTime(expected))
        );
        assert_eq!(
            parse_absolute("2020-10-03 12:31am"),
            Some(Absolute::DateTime(date(2020, 10, 3).and_time(time(0, 31, 0))))
        );
    }

    #[test]
    fn rejects_non_absolute_tokens() {
        for token in ["", "5", "-8h", "5m23s", "13pm", "25:00", "2020-13-01", "banana"] {
            assert_eq!(parse_absolute(token), None, "token {token:?}");
        }
    }
}
