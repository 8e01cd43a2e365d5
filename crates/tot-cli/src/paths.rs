use std::path::{Path, PathBuf};

use log::debug;
use snafu::ResultExt;

use crate::error::{CliResult, CurrentDirSnafu};

/// Pick the series directory: `--path` / `TOT_PATH` if given (clap merges
/// the two), otherwise the current working directory.
pub fn resolve_storage_dir(explicit: Option<&Path>) -> CliResult<PathBuf> {
    let dir = match explicit {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir().context(CurrentDirSnafu)?,
    };

    debug!("using series directory {}", dir.display());
    Ok(dir)
}
