use std::path::PathBuf;
use tracker_common::RecordError;

pub const NO_DATA_MESSAGE: &str =
    "No data in the ledger. Add entries first with: sat-tracker record 1000";

/// Error type for CLI command failures
#[derive(Debug)]
pub enum CliError {
    ConfigLoad(anyhow::Error),
    LedgerOpen(PathBuf, anyhow::Error),
    PriceClient(anyhow::Error),
    Record(RecordError),
    Report(anyhow::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::ConfigLoad(e) => {
                write!(
                    f,
                    "Failed to load configuration: {:#}\n\nPossible fixes:\n  - Check the path passed with --config\n  - Validate the TOML syntax of the file",
                    e
                )
            }
            CliError::LedgerOpen(path, e) => {
                write!(
                    f,
                    "Failed to open ledger '{}': {:#}\n\nPossible fixes:\n  - Check file permissions\n  - Use --db to specify a different location",
                    path.display(),
                    e
                )
            }
            CliError::PriceClient(e) => write!(f, "Failed to set up price client: {:#}", e),
            CliError::Record(e) => write!(f, "{}", e),
            CliError::Report(e) => write!(f, "Error generating report: {:#}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigLoad(e) => Some(e.as_ref()),
            CliError::LedgerOpen(_, e) => Some(e.as_ref()),
            CliError::PriceClient(e) => Some(e.as_ref()),
            CliError::Record(e) => Some(e),
            CliError::Report(e) => Some(e.as_ref()),
        }
    }
}

impl From<RecordError> for CliError {
    fn from(error: RecordError) -> Self {
        CliError::Record(error)
    }
}
