//! Series definitions and the delimited line format.
//!
//! A series is stored as plain text: a header line `time,<col1>,<col2>,...`
//! followed by one line per row, `<timestamp>,<val1>,...`. There is no
//! quoting, so values and column names may not contain the delimiter or a
//! line break. The header line is the only schema: a definition is always
//! re-derived from it and never stored anywhere else.

use std::path::Path;

use chrono::NaiveDateTime;

use crate::error::{
    InvalidColumnNameSnafu, InvalidSeriesNameSnafu, InvalidValueSnafu, TooFewValuesSnafu,
    TooManyValuesSnafu, TotResult,
};
use crate::time::format_timestamp;

/// Extension appended to series names that carry none.
pub const DEFAULT_EXTENSION: &str = "csv";

/// Name of the implicit first column of every series.
pub const TIME_COLUMN: &str = "time";

/// Field delimiter of the stored format.
pub const FIELD_DELIMITER: char = ',';

/// Map a series name to the key (file name) it is stored under.
///
/// `ate` becomes `ate.csv`; `ate.csv` and `notes.txt` are kept as given.
///
/// # Errors
/// `InvalidSeriesName` if the key would not be a plain file name inside the
/// storage directory: empty names, path separators, `..`, a leading dot or
/// NUL.
pub fn storage_key(name: &str) -> TotResult<String> {
    validate_series_name(name)?;

    let has_extension = Path::new(name)
        .extension()
        .is_some_and(|ext| !ext.to_string_lossy().trim().is_empty());

    if has_extension {
        Ok(name.to_string())
    } else {
        Ok(format!("{name}.{DEFAULT_EXTENSION}"))
    }
}

fn validate_series_name(name: &str) -> TotResult<()> {
    let reason = if name.trim().is_empty() {
        Some("names can't be empty")
    } else if name.contains(['/', '\\']) {
        Some("names can't contain path separators")
    } else if name.contains("..") {
        Some("names can't contain \"..\"")
    } else if name.starts_with('.') {
        Some("names can't start with a dot")
    } else if name.contains('\0') {
        Some("names can't contain NUL")
    } else {
        None
    };

    match reason {
        Some(reason) => InvalidSeriesNameSnafu { name, reason }.fail(),
        None => Ok(()),
    }
}

/// The name to list for a stored key carrying the default extension.
///
/// The result always maps back to `key` through [`storage_key`]: `ate.csv`
/// lists as `ate`, but `blood.pressure.csv` lists as itself because
/// `blood.pressure` would be kept extension and all. Keys with any other
/// extension, or that no valid name maps to, give `None`.
pub fn series_name(key: &str) -> Option<&str> {
    let stem = key
        .strip_suffix(DEFAULT_EXTENSION)
        .and_then(|rest| rest.strip_suffix('.'))?;

    [stem, key]
        .into_iter()
        .find(|name| storage_key(name).is_ok_and(|k| k == key))
}

/// The column layout of one series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesDefinition {
    name: String,
    storage_key: String,
    value_columns: Vec<String>,
}

impl SeriesDefinition {
    /// Declare a new series. Column names are the user-supplied value
    /// columns; the time column is implicit.
    ///
    /// # Errors
    /// Returns `InvalidSeriesName` for names [`storage_key`] rejects, and
    /// `InvalidColumnName` if a column name contains a comma or a line break.
    pub fn new(name: &str, value_columns: &[String]) -> TotResult<Self> {
        let storage_key = storage_key(name)?;

        for column in value_columns {
            if let Some(forbidden) = forbidden_content(column) {
                return InvalidColumnNameSnafu {
                    name: column.clone(),
                    forbidden,
                }
                .fail();
            }
        }

        Ok(Self {
            name: name.to_string(),
            storage_key,
            value_columns: value_columns.to_vec(),
        })
    }

    /// Re-derive a definition from the stored header line. Only the line
    /// terminator is stripped; column names are kept byte for byte.
    pub fn from_header(name: &str, header: &str) -> TotResult<Self> {
        let value_columns = header
            .trim_end_matches(['\r', '\n'])
            .split(FIELD_DELIMITER)
            .skip(1)
            .map(str::to_string)
            .collect();

        Ok(Self {
            name: name.to_string(),
            storage_key: storage_key(name)?,
            value_columns,
        })
    }

    /// The series name as given by the caller.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The key (file name) the series is stored under.
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Declared value columns, time column excluded.
    pub fn value_columns(&self) -> &[String] {
        &self.value_columns
    }

    /// Number of values each row must supply.
    pub fn arity(&self) -> usize {
        self.value_columns.len()
    }

    /// Check that `values` fits this series.
    ///
    /// Arity is checked first, then delimiter content.
    ///
    /// # Errors
    /// `TooManyValues`, `TooFewValues` or `InvalidValue`.
    pub fn validate_values(&self, values: &[String]) -> TotResult<()> {
        if values.len() > self.arity() {
            return TooManyValuesSnafu {
                name: self.name.clone(),
                expected: self.value_columns.clone(),
            }
            .fail();
        }

        if values.len() < self.arity() {
            return TooFewValuesSnafu {
                name: self.name.clone(),
                expected: self.value_columns.clone(),
            }
            .fail();
        }

        if let Some(value) = values.iter().find(|v| v.contains(FIELD_DELIMITER)) {
            return InvalidValueSnafu {
                value: value.clone(),
                forbidden: "commas",
            }
            .fail();
        }

        if let Some(value) = values.iter().find(|v| contains_line_break(v)) {
            return InvalidValueSnafu {
                value: value.clone(),
                forbidden: "newlines",
            }
            .fail();
        }

        Ok(())
    }

    /// `time` followed by the declared columns, comma-joined.
    pub fn format_header(&self) -> String {
        std::iter::once(TIME_COLUMN)
            .chain(self.value_columns.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// The formatted timestamp followed by `values`, comma-joined.
    pub fn format_row(&self, timestamp: NaiveDateTime, values: &[String]) -> String {
        let mut line = format_timestamp(timestamp);
        for value in values {
            line.push(FIELD_DELIMITER);
            line.push_str(value);
        }
        line
    }
}

fn contains_line_break(s: &str) -> bool {
    s.contains(['\n', '\r'])
}

fn forbidden_content(s: &str) -> Option<&'static str> {
    if s.contains(FIELD_DELIMITER) {
        Some("commas")
    } else if contains_line_break(s) {
        Some("newlines")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TotError;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn definition(columns: &[&str]) -> SeriesDefinition {
        SeriesDefinition::new("series", &strings(columns)).expect("valid columns")
    }

    #[test]
    fn storage_key_appends_default_extension() -> Result<(), Box<dyn std::error::Error>> {
        assert_eq!(storage_key("ate")?, "ate.csv");
        assert_eq!(storage_key("somefile.csv")?, "somefile.csv");
        assert_eq!(storage_key("notes.txt")?, "notes.txt");
        Ok(())
    }

    #[test]
    fn storage_key_stays_inside_the_directory() {
        for name in ["", "  ", "../x", "sub/x", "sub\\x", "..", "a..b", ".hidden", "nul\0"] {
            let err = storage_key(name).unwrap_err();
            assert!(
                matches!(err, TotError::InvalidSeriesName { .. }),
                "{name:?} gave {err}"
            );
        }

        let err = SeriesDefinition::new("../escaped", &[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid series name \"../escaped\": names can't contain path separators."
        );
    }

    #[test]
    fn series_name_strips_only_the_default_extension() {
        assert_eq!(series_name("ate.csv"), Some("ate"));
        assert_eq!(series_name("notes.txt"), None);
        assert_eq!(series_name(".csv"), None);
    }

    #[test]
    fn listed_names_map_back_to_their_key() {
        assert_eq!(series_name("blood.pressure.csv"), Some("blood.pressure.csv"));
        for key in ["ate.csv", "blood.pressure.csv"] {
            let name = series_name(key).expect("listed");
            assert_eq!(storage_key(name).expect("valid name"), key);
        }
    }

    #[test]
    fn header_has_implicit_time_column() {
        assert_eq!(
            definition(&["what", "howMany"]).format_header(),
            "time,what,howMany"
        );
        assert_eq!(definition(&[]).format_header(), "time");
    }

    #[test]
    fn from_header_recovers_declared_columns() {
        let def = SeriesDefinition::from_header("ate", "time,what,howMany\n").expect("valid");
        assert_eq!(def.value_columns(), strings(&["what", "howMany"]).as_slice());
        assert_eq!(def.arity(), 2);
        assert_eq!(def.storage_key(), "ate.csv");

        let bare = SeriesDefinition::from_header("cat", "time").expect("valid");
        assert_eq!(bare.arity(), 0);
    }

    #[test]
    fn from_header_keeps_trailing_spaces_in_column_names() {
        let def = SeriesDefinition::from_header("ate", "time,what ,amount \r\n").expect("valid");
        assert_eq!(def.value_columns(), strings(&["what ", "amount "]).as_slice());
    }

    #[test]
    fn rows_start_with_second_precision_timestamp() {
        let ts = NaiveDateTime::parse_from_str("2020-10-04T15:00:00", "%Y-%m-%dT%H:%M:%S")
            .expect("valid timestamp");
        assert_eq!(
            definition(&["what", "howMany"]).format_row(ts, &strings(&["bananas", "3"])),
            "2020-10-04T15:00:00,bananas,3"
        );
        assert_eq!(definition(&[]).format_row(ts, &[]), "2020-10-04T15:00:00");
    }

    #[test]
    fn validate_rejects_wrong_arity() {
        let def = definition(&["one", "two"]);

        let err = def.validate_values(&strings(&["1", "2", "3"])).unwrap_err();
        assert!(matches!(err, TotError::TooManyValues { ref expected, .. } if expected == &strings(&["one", "two"])));

        let err = def.validate_values(&strings(&["1"])).unwrap_err();
        assert!(matches!(err, TotError::TooFewValues { .. }));

        assert!(def.validate_values(&strings(&["1", "2"])).is_ok());
    }

    #[test]
    fn validate_rejects_delimiters_and_line_breaks() {
        let def = definition(&["value"]);

        let err = def.validate_values(&strings(&["one,two"])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Values can't contain commas but this does: \"one,two\""
        );

        let err = def.validate_values(&strings(&["one\ntwo"])).unwrap_err();
        assert!(matches!(err, TotError::InvalidValue { forbidden: "newlines", .. }));
    }

    #[test]
    fn column_names_cannot_contain_commas() {
        let err = SeriesDefinition::new("bad", &strings(&["a,b"])).unwrap_err();
        assert!(matches!(err, TotError::InvalidColumnName { .. }));
    }
}
