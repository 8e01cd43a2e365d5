use snafu::Snafu;
use tot_core::TotError;

pub type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CliError {
    /// Validation and storage errors from the core, shown as-is.
    #[snafu(context(false), display("{source}"))]
    Tot { source: TotError },

    #[snafu(display(
        "Specify a series to record to, or one of the commands add, list or latest."
    ))]
    MissingSeries,

    #[snafu(display("Could not determine the current directory: {source}"))]
    CurrentDir { source: std::io::Error },

    #[snafu(display("Failed to write output: {source}"))]
    Output { source: std::io::Error },
}
