//! Error taxonomy shared by every part of `tot-core`.
//!
//! All variants describe input the caller can correct and retry; none of
//! them signal a bug. The CLI prints the display string and exits with
//! status 1.

use std::io;

use snafu::Snafu;

/// Result alias used throughout `tot-core`.
pub type TotResult<T> = Result<T, TotError>;

/// Errors raised by series validation, time resolution and the data
/// accessors.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TotError {
    /// No series has been created under the storage key derived from `name`.
    #[snafu(display("Series \"{name}\" hasn't been defined. Use tot add to define it."))]
    SeriesNotDefined {
        /// The series name as given by the caller.
        name: String,
    },

    /// A series already exists under the storage key derived from `name`.
    #[snafu(display("Series \"{name}\" has already been defined."))]
    SeriesAlreadyDefined {
        /// The series name as given by the caller.
        name: String,
    },

    /// More values were supplied than the series declares columns for.
    #[snafu(display(
        "Too many values specified. Series \"{name}\" {}",
        describe_expected(expected)
    ))]
    TooManyValues {
        /// The series name.
        name: String,
        /// Declared value columns, in creation order (the time column excluded).
        expected: Vec<String>,
    },

    /// Fewer values were supplied than the series declares columns for.
    #[snafu(display(
        "Too few values specified. Series \"{name}\" {}",
        describe_expected(expected)
    ))]
    TooFewValues {
        /// The series name.
        name: String,
        /// Declared value columns, in creation order (the time column excluded).
        expected: Vec<String>,
    },

    /// A value contains the field delimiter or a line break.
    #[snafu(display("Values can't contain {forbidden} but this does: \"{value}\""))]
    InvalidValue {
        /// The offending value.
        value: String,
        /// What was found, e.g. `commas` or `newlines`.
        forbidden: &'static str,
    },

    /// A series name cannot be mapped to a storage key inside the storage
    /// directory.
    #[snafu(display("Invalid series name \"{name}\": {reason}."))]
    InvalidSeriesName {
        /// The name as given by the caller.
        name: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// A declared column name contains the field delimiter or a line break.
    #[snafu(display("Column names can't contain {forbidden} but this does: \"{name}\""))]
    InvalidColumnName {
        /// The offending column name.
        name: String,
        /// What was found, e.g. `commas` or `newlines`.
        forbidden: &'static str,
    },

    /// A time token matched neither the absolute nor the relative grammar.
    #[snafu(display("Couldn't figure out what time \"{token}\" refers to."))]
    UnrecognizedTime {
        /// The token as typed by the user.
        token: String,
    },

    /// A row timestamp has no four-digit-year representation.
    #[snafu(display("Timestamp {timestamp} is outside the years 0000 to 9999."))]
    TimestampOutOfRange {
        /// The timestamp, as chrono renders it.
        timestamp: String,
    },

    /// The storage directory handed to the file accessor does not exist.
    #[snafu(display("Directory does not exist: {path}"))]
    StorageDirectoryMissing {
        /// The directory that was looked up.
        path: String,
    },

    /// A series file exists but holds no header line.
    #[snafu(display("Series file has no header line: {path}"))]
    MissingHeader {
        /// The series file.
        path: String,
    },

    /// A stored row does not start with a `YYYY-MM-DDTHH:MM:SS` timestamp.
    #[snafu(display("Series \"{series}\" contains a malformed row: {line}"))]
    MalformedRow {
        /// The series being read.
        series: String,
        /// The raw stored line.
        line: String,
    },

    /// An I/O error occurred on the local filesystem.
    #[snafu(display("Local I/O error at {path}: {source}"))]
    Io {
        /// The path where the I/O error occurred.
        path: String,
        /// Underlying I/O error.
        source: io::Error,
    },
}

fn describe_expected(expected: &[String]) -> String {
    if expected.is_empty() {
        "expects none.".to_string()
    } else {
        format!("expects values for: {}", expected.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_messages_list_expected_columns() {
        let err = TotError::TooFewValues {
            name: "series".to_string(),
            expected: vec!["one".to_string(), "two".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Too few values specified. Series \"series\" expects values for: one,two"
        );
    }

    #[test]
    fn arity_message_for_zero_columns_says_none() {
        let err = TotError::TooManyValues {
            name: "things".to_string(),
            expected: vec![],
        };
        assert_eq!(
            err.to_string(),
            "Too many values specified. Series \"things\" expects none."
        );
    }
}
