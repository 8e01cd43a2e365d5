//! Reading series back: chronological ordering, `--after` filtering,
//! distinct days and the latest row of every series.
//!
//! Rows are stored in append order, which need not be chronological, so
//! everything here sorts by the parsed leading timestamp. Sorting is stable:
//! rows sharing a timestamp keep their append order.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use snafu::OptionExt;

use crate::accessor::DataAccessor;
use crate::error::{MalformedRowSnafu, TotResult};
use crate::series::FIELD_DELIMITER;
use crate::time::{Resolution, format_timestamp, parse_timestamp};

/// One stored row with its parsed timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesEntry {
    /// Leading field of the row, parsed.
    pub timestamp: NaiveDateTime,
    /// The row exactly as stored.
    pub line: String,
}

/// Lower bound for listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterBound {
    /// Keep only rows on this calendar day.
    Day(NaiveDate),
    /// Keep rows at or after this instant.
    From(NaiveDateTime),
}

impl AfterBound {
    /// Whether a row stamped `timestamp` passes the bound.
    pub fn matches(&self, timestamp: NaiveDateTime) -> bool {
        match *self {
            AfterBound::Day(day) => timestamp.date() == day,
            AfterBound::From(start) => timestamp >= start,
        }
    }
}

impl From<Resolution> for AfterBound {
    /// A pure calendar date bounds a whole day; anything else is a threshold.
    fn from(resolution: Resolution) -> Self {
        if resolution.is_whole_day() {
            AfterBound::Day(resolution.timestamp.date())
        } else {
            AfterBound::From(resolution.timestamp)
        }
    }
}

/// Options for [`list_series_contents`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ListOptions {
    /// Optional lower bound.
    pub after: Option<AfterBound>,
    /// Collapse rows to the distinct days they fall on.
    pub days: bool,
}

/// The latest row of one series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestEntry {
    /// Series name.
    pub series: String,
    /// Its chronologically last row.
    pub entry: SeriesEntry,
}

/// All rows of `name`, header skipped, in chronological order.
///
/// # Errors
/// `SeriesNotDefined`, storage errors, or `MalformedRow` if a stored row
/// does not start with a `YYYY-MM-DDTHH:MM:SS` timestamp.
pub fn read_series_entries(
    accessor: &dyn DataAccessor,
    name: &str,
) -> TotResult<Vec<SeriesEntry>> {
    let mut entries = accessor
        .read_lines(name)?
        .skip(1)
        .map(|line| parse_entry(name, line?))
        .collect::<TotResult<Vec<_>>>()?;

    entries.sort_by_key(|e| e.timestamp);
    Ok(entries)
}

fn parse_entry(series: &str, line: String) -> TotResult<SeriesEntry> {
    let field = line.split(FIELD_DELIMITER).next().unwrap_or_default();
    let timestamp = parse_timestamp(field).context(MalformedRowSnafu {
        series,
        line: line.as_str(),
    })?;
    Ok(SeriesEntry { timestamp, line })
}

/// Keep the entries passing `bound`, preserving order.
pub fn filter_after(entries: Vec<SeriesEntry>, bound: AfterBound) -> Vec<SeriesEntry> {
    entries
        .into_iter()
        .filter(|e| bound.matches(e.timestamp))
        .collect()
}

/// Distinct calendar days of `entries`, ascending.
pub fn unique_days(entries: &[SeriesEntry]) -> Vec<NaiveDate> {
    entries
        .iter()
        .map(|e| e.timestamp.date())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Lines to print for `tot list <series>`.
///
/// Rows come back chronologically, filtered by `opts.after`. With
/// `opts.days` each distinct day is printed once as its midnight timestamp.
pub fn list_series_contents(
    accessor: &dyn DataAccessor,
    name: &str,
    opts: &ListOptions,
) -> TotResult<Vec<String>> {
    let mut entries = read_series_entries(accessor, name)?;
    if let Some(bound) = opts.after {
        entries = filter_after(entries, bound);
    }

    if opts.days {
        return Ok(unique_days(&entries)
            .into_iter()
            .map(|day| format_timestamp(day.and_time(NaiveTime::MIN)))
            .collect());
    }

    Ok(entries.into_iter().map(|e| e.line).collect())
}

/// The latest row of every series that has rows, ordered by that row's
/// timestamp. Ties keep series names in ascending order.
pub fn latest_entries(accessor: &dyn DataAccessor) -> TotResult<Vec<LatestEntry>> {
    let mut latest = Vec::new();
    for series in accessor.list_series()? {
        if let Some(entry) = read_series_entries(accessor, &series)?.pop() {
            latest.push(LatestEntry { series, entry });
        }
    }

    latest.sort_by_key(|l| l.entry.timestamp);
    Ok(latest)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::accessor::{FileDataAccessor, InMemoryDataAccessor};
    use crate::clock::MockClock;
    use crate::error::TotError;
    use crate::time::resolve_detailed;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn at(s: &str) -> NaiveDateTime {
        parse_timestamp(s).expect("valid timestamp")
    }

    fn values(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn accessor() -> InMemoryDataAccessor {
        InMemoryDataAccessor::new(Arc::new(MockClock::default()))
    }

    fn fruit() -> Result<InMemoryDataAccessor, TotError> {
        let mut acc = accessor();
        acc.create_series("fruit", &values(&["name", "deliciousness"]))?;
        for (ts, name, score) in [
            ("2020-10-04T15:00:00", "apple", "3"),
            ("2020-10-05T15:00:00", "banana", "19"),
            ("2020-10-06T00:00:00", "cherry", "2000"),
            ("2020-10-06T15:00:00", "durian", "89"),
        ] {
            acc.append_values("fruit", Some(at(ts)), &values(&[name, score]))?;
        }
        Ok(acc)
    }

    #[test]
    fn entries_are_sorted_chronologically() -> TestResult {
        let mut acc = accessor();
        acc.create_series("things", &[])?;
        for ts in [
            "2020-10-06T00:00:00",
            "2020-10-04T15:00:00",
            "2020-10-04T13:00:00",
        ] {
            acc.append_values("things", Some(at(ts)), &[])?;
        }

        let lines = list_series_contents(&acc, "things", &ListOptions::default())?;
        assert_eq!(
            lines,
            vec![
                "2020-10-04T13:00:00",
                "2020-10-04T15:00:00",
                "2020-10-06T00:00:00"
            ]
        );
        Ok(())
    }

    #[test]
    fn a_pure_date_bound_selects_that_day_only() -> TestResult {
        let acc = fruit()?;
        let bound: AfterBound = resolve_detailed("2020-10-05", at("2020-10-10T00:00:00"))?.into();

        let lines = list_series_contents(
            &acc,
            "fruit",
            &ListOptions {
                after: Some(bound),
                days: false,
            },
        )?;
        assert_eq!(lines, vec!["2020-10-05T15:00:00,banana,19"]);
        Ok(())
    }

    #[test]
    fn an_instant_bound_is_a_threshold() -> TestResult {
        let acc = fruit()?;
        let bound: AfterBound = resolve_detailed("2020-10-05 3pm", at("2020-10-10T00:00:00"))?.into();

        let lines = list_series_contents(
            &acc,
            "fruit",
            &ListOptions {
                after: Some(bound),
                days: false,
            },
        )?;
        assert_eq!(
            lines,
            vec![
                "2020-10-05T15:00:00,banana,19",
                "2020-10-06T00:00:00,cherry,2000",
                "2020-10-06T15:00:00,durian,89"
            ]
        );
        Ok(())
    }

    #[test]
    fn days_mode_collapses_rows_per_day() -> TestResult {
        let acc = fruit()?;

        let lines = list_series_contents(
            &acc,
            "fruit",
            &ListOptions {
                after: None,
                days: true,
            },
        )?;
        assert_eq!(
            lines,
            vec![
                "2020-10-04T00:00:00",
                "2020-10-05T00:00:00",
                "2020-10-06T00:00:00"
            ]
        );
        Ok(())
    }

    #[test]
    fn latest_orders_series_by_their_last_row() -> TestResult {
        let mut acc = accessor();
        acc.create_series("one", &[])?;
        for ts in [
            "2020-10-25T00:00:00",
            "2020-10-26T00:00:00",
            "2020-10-24T00:00:00",
            "2020-10-23T00:00:00",
        ] {
            acc.append_values("one", Some(at(ts)), &[])?;
        }
        acc.create_series("two", &values(&["col1", "col2"]))?;
        acc.append_values("two", Some(at("2020-10-08T00:00:00")), &values(&["a", "b"]))?;
        acc.append_values("two", Some(at("2020-10-08T00:00:00")), &values(&["c", "d"]))?;
        acc.create_series("empty", &[])?;

        let latest = latest_entries(&acc)?;
        let rendered: Vec<_> = latest
            .iter()
            .map(|l| (l.series.as_str(), l.entry.line.as_str()))
            .collect();
        assert_eq!(
            rendered,
            vec![
                ("two", "2020-10-08T00:00:00,c,d"),
                ("one", "2020-10-26T00:00:00")
            ]
        );
        Ok(())
    }

    #[test]
    fn malformed_rows_are_reported() -> TestResult {
        let tmp = tempfile::TempDir::new()?;
        std::fs::write(
            tmp.path().join("x.csv"),
            "time,what\n2020-10-04T13:00:00,fine\nyesterday,edited\n",
        )?;
        let acc = FileDataAccessor::open(tmp.path(), Arc::new(MockClock::default()))?;

        let err = read_series_entries(&acc, "x").unwrap_err();
        assert!(matches!(err, TotError::MalformedRow { ref line, .. } if line == "yesterday,edited"));
        Ok(())
    }

    #[test]
    fn unknown_series_cannot_be_listed() {
        let acc = accessor();
        assert!(matches!(
            read_series_entries(&acc, "nope"),
            Err(TotError::SeriesNotDefined { .. })
        ));
    }
}
