use std::{
    collections::BTreeSet,
    fs::{self, File, OpenOptions},
    io::{self, BufRead, BufReader, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::NaiveDateTime;
use log::{debug, warn};
use snafu::prelude::*;

use super::{DataAccessor, Lines, prepare_row};
use crate::clock::Clock;
use crate::error::{
    IoSnafu, MissingHeaderSnafu, SeriesAlreadyDefinedSnafu, StorageDirectoryMissingSnafu,
    TotResult,
};
use crate::series::{self, SeriesDefinition};

const LINE_ENDING: &str = if cfg!(windows) { "\r\n" } else { "\n" };

/// Stores each series as a delimited text file in one directory.
///
/// Layout:
///   <dir>/ate.csv
///   <dir>/weight.csv
///
/// No locking is done; concurrent writers race at the file system level.
pub struct FileDataAccessor {
    directory: PathBuf,
    clock: Arc<dyn Clock>,
}

impl FileDataAccessor {
    /// Open the series directory `directory`.
    ///
    /// # Errors
    /// `StorageDirectoryMissing` if `directory` is not an existing directory.
    pub fn open(directory: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> TotResult<Self> {
        let directory = directory.into();
        ensure!(
            directory.is_dir(),
            StorageDirectoryMissingSnafu {
                path: directory.display().to_string(),
            }
        );
        Ok(Self { directory, clock })
    }

    /// The directory holding the series files.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, name: &str) -> TotResult<PathBuf> {
        Ok(self.directory.join(series::storage_key(name)?))
    }
}

impl DataAccessor for FileDataAccessor {
    fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    fn series_definition(&self, name: &str) -> TotResult<Option<SeriesDefinition>> {
        let path = self.path_for(name)?;
        let path_str = path.display().to_string();

        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).context(IoSnafu { path: path_str }),
        };

        let mut header = String::new();
        let read = BufReader::new(file)
            .read_line(&mut header)
            .context(IoSnafu {
                path: path_str.clone(),
            })?;
        ensure!(read > 0, MissingHeaderSnafu { path: path_str });

        debug!("read header of {path_str}: {}", header.trim_end());
        SeriesDefinition::from_header(name, &header).map(Some)
    }

    fn create_series(&mut self, name: &str, column_names: &[String]) -> TotResult<()> {
        let definition = SeriesDefinition::new(name, column_names)?;
        let path = self.directory.join(definition.storage_key());
        let path_str = path.display().to_string();

        // Create-only-if-absent on the target path.
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return SeriesAlreadyDefinedSnafu { name }.fail();
            }
            Err(e) => return Err(e).context(IoSnafu { path: path_str }),
        };

        let header = definition.format_header();
        file.write_all(format!("{header}{LINE_ENDING}").as_bytes())
            .context(IoSnafu {
                path: path_str.clone(),
            })?;

        debug!("created series {name:?} at {path_str}");
        Ok(())
    }

    fn append_values(
        &mut self,
        name: &str,
        timestamp: Option<NaiveDateTime>,
        values: &[String],
    ) -> TotResult<()> {
        let (definition, line) = prepare_row(self, name, timestamp, values)?;
        let path = self.directory.join(definition.storage_key());
        let path_str = path.display().to_string();

        let mut file = OpenOptions::new()
            .append(true)
            .open(&path)
            .context(IoSnafu {
                path: path_str.clone(),
            })?;
        file.write_all(format!("{line}{LINE_ENDING}").as_bytes())
            .context(IoSnafu {
                path: path_str.clone(),
            })?;

        debug!("appended to {path_str}: {line}");
        Ok(())
    }

    fn list_series(&self) -> TotResult<BTreeSet<String>> {
        let entries = fs::read_dir(&self.directory).context(IoSnafu {
            path: self.directory.display().to_string(),
        })?;

        let mut names = BTreeSet::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(
                        "skipping unreadable entry in {}: {e}",
                        self.directory.display()
                    );
                    continue;
                }
            };

            if !entry.file_type().is_ok_and(|t| t.is_file()) {
                continue;
            }

            let file_name = entry.file_name();
            let Some(key) = file_name.to_str() else {
                warn!("skipping non-UTF-8 file name {file_name:?}");
                continue;
            };

            if let Some(name) = series::series_name(key) {
                names.insert(name.to_string());
            }
        }

        Ok(names)
    }

    fn read_lines(&self, name: &str) -> TotResult<Lines<'_>> {
        let definition = self.definition_or_fail(name)?;
        let path = self.directory.join(definition.storage_key());
        let path_str = path.display().to_string();

        let file = File::open(&path).context(IoSnafu {
            path: path_str.clone(),
        })?;

        // The reader owns the handle, so dropping the iterator closes the file
        // whether or not the caller read to the end.
        let lines = BufReader::new(file)
            .lines()
            .map(move |line| {
                line.context(IoSnafu {
                    path: path_str.clone(),
                })
            })
            .filter(|line| !matches!(line, Ok(l) if l.trim().is_empty()));

        Ok(Box::new(lines))
    }
}
