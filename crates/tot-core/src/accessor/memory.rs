use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use chrono::NaiveDateTime;
use snafu::prelude::*;

use super::{DataAccessor, Lines, prepare_row};
use crate::clock::Clock;
use crate::error::{MissingHeaderSnafu, SeriesAlreadyDefinedSnafu, TotResult};
use crate::series::{self, SeriesDefinition};

/// Keeps every series as a list of lines in memory, keyed like the file
/// backend's file names.
pub struct InMemoryDataAccessor {
    files: BTreeMap<String, Vec<String>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryDataAccessor {
    /// An empty store reading unset timestamps from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            files: BTreeMap::new(),
            clock,
        }
    }

    /// Stored lines by storage key.
    pub fn files(&self) -> &BTreeMap<String, Vec<String>> {
        &self.files
    }
}

impl DataAccessor for InMemoryDataAccessor {
    fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    fn series_definition(&self, name: &str) -> TotResult<Option<SeriesDefinition>> {
        let key = series::storage_key(name)?;
        let Some(lines) = self.files.get(&key) else {
            return Ok(None);
        };

        let header = lines.first().context(MissingHeaderSnafu { path: key })?;
        SeriesDefinition::from_header(name, header).map(Some)
    }

    fn create_series(&mut self, name: &str, column_names: &[String]) -> TotResult<()> {
        let definition = SeriesDefinition::new(name, column_names)?;
        ensure!(
            !self.files.contains_key(definition.storage_key()),
            SeriesAlreadyDefinedSnafu { name }
        );

        self.files.insert(
            definition.storage_key().to_string(),
            vec![definition.format_header()],
        );
        Ok(())
    }

    fn append_values(
        &mut self,
        name: &str,
        timestamp: Option<NaiveDateTime>,
        values: &[String],
    ) -> TotResult<()> {
        let (definition, line) = prepare_row(self, name, timestamp, values)?;
        self.files
            .entry(definition.storage_key().to_string())
            .or_default()
            .push(line);
        Ok(())
    }

    fn list_series(&self) -> TotResult<BTreeSet<String>> {
        Ok(self
            .files
            .keys()
            .filter_map(|key| series::series_name(key))
            .map(str::to_string)
            .collect())
    }

    fn read_lines(&self, name: &str) -> TotResult<Lines<'_>> {
        let definition = self.definition_or_fail(name)?;
        let lines = self
            .files
            .get(definition.storage_key())
            .map(|lines| lines.iter())
            .unwrap_or_default()
            .cloned()
            .map(Ok);
        Ok(Box::new(lines))
    }
}
