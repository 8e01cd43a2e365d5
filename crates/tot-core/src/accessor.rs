//! The data accessor contract and its two backends.
//!
//! A [`DataAccessor`] owns series existence and definition state. Both
//! backends map a series name to a storage key (see
//! [`storage_key`](crate::series::storage_key)) holding an ordered sequence
//! of lines whose first line is the header. The header *is* the
//! definition; neither backend keeps a separate schema.
//!
//! - [`FileDataAccessor`] keeps one `<key>` file per series in a directory.
//! - [`InMemoryDataAccessor`] keeps the lines in a map; used by tests.
//!
//! The backend is picked once at construction; callers work against
//! `&mut dyn DataAccessor`.

mod file;
mod memory;

pub use file::FileDataAccessor;
pub use memory::InMemoryDataAccessor;

use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use snafu::{OptionExt, ensure};

use crate::clock::Clock;
use crate::error::{SeriesNotDefinedSnafu, TimestampOutOfRangeSnafu, TotResult};
use crate::series::SeriesDefinition;
use crate::time;

/// Lazily produced stored lines, header first, blank lines skipped.
pub type Lines<'a> = Box<dyn Iterator<Item = TotResult<String>> + 'a>;

/// Storage operations shared by every backend.
pub trait DataAccessor {
    /// The clock used for unset timestamps, also handed to time resolution.
    fn clock(&self) -> &dyn Clock;

    /// Look up the definition derived from the header of `name`'s storage.
    ///
    /// Returns `Ok(None)` if nothing is stored under the series' key.
    fn series_definition(&self, name: &str) -> TotResult<Option<SeriesDefinition>>;

    /// Define a new series with the given value columns.
    ///
    /// # Errors
    /// `SeriesAlreadyDefined` if the storage key is already taken,
    /// `InvalidSeriesName` for names that do not map to a plain storage key,
    /// `InvalidColumnName` for column names containing delimiters.
    fn create_series(&mut self, name: &str, column_names: &[String]) -> TotResult<()>;

    /// Append one row. With `timestamp == None` the accessor's clock is
    /// read when the row is formatted.
    ///
    /// # Errors
    /// `SeriesNotDefined`, any validation error of
    /// [`SeriesDefinition::validate_values`], or `TimestampOutOfRange` for a
    /// timestamp the stored format cannot hold.
    fn append_values(
        &mut self,
        name: &str,
        timestamp: Option<NaiveDateTime>,
        values: &[String],
    ) -> TotResult<()>;

    /// Names of all defined series.
    fn list_series(&self) -> TotResult<BTreeSet<String>>;

    /// Raw stored lines of a series, header included.
    ///
    /// # Errors
    /// `SeriesNotDefined` if the series does not exist.
    fn read_lines(&self, name: &str) -> TotResult<Lines<'_>>;

    /// Like [`series_definition`](Self::series_definition), but a missing
    /// series is an error.
    fn definition_or_fail(&self, name: &str) -> TotResult<SeriesDefinition> {
        self.series_definition(name)?
            .context(SeriesNotDefinedSnafu { name })
    }

    /// Append a row stamped with the accessor's current time.
    fn append_now(&mut self, name: &str, values: &[String]) -> TotResult<()> {
        self.append_values(name, None, values)
    }
}

/// Validate `values` against `name`'s definition and format the row line.
fn prepare_row(
    accessor: &dyn DataAccessor,
    name: &str,
    timestamp: Option<NaiveDateTime>,
    values: &[String],
) -> TotResult<(SeriesDefinition, String)> {
    let definition = accessor.definition_or_fail(name)?;
    definition.validate_values(values)?;

    let timestamp = timestamp.unwrap_or_else(|| accessor.clock().now());
    ensure!(
        time::is_storable(timestamp),
        TimestampOutOfRangeSnafu {
            timestamp: timestamp.to_string(),
        }
    );

    let line = definition.format_row(timestamp, values);
    Ok((definition, line))
}
