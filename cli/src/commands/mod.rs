mod init;
mod list;
mod record;
mod report;

use crate::argparse::{Cli, Commands};
pub use init::handle_init_command;
pub use list::handle_list_command;
pub use record::handle_record_command;
pub use report::handle_report_command;
use sat_tracker::CliError;
use std::path::Path;
use tracker_common::{LedgerStore, SqliteLedger, TrackerConfig};

pub async fn handle_command(cli: Cli) -> Result<(), CliError> {
    let mut config =
        TrackerConfig::load_or_default(cli.config.as_deref()).map_err(CliError::ConfigLoad)?;
    if let Some(db) = cli.db {
        config.ledger.database_path = db;
    }

    match cli.command {
        Commands::Init => handle_init_command(&config).await,
        Commands::Record(args) => handle_record_command(args, &config).await,
        Commands::Report(args) => handle_report_command(args, config).await,
        Commands::List => handle_list_command(&config).await,
    }
}

/// Opens the ledger for writing, creating the file and schema on first use.
async fn open_ledger(path: &Path) -> Result<SqliteLedger, CliError> {
    let ledger = SqliteLedger::open(path)
        .await
        .map_err(|e| CliError::LedgerOpen(path.to_path_buf(), e))?;
    ledger
        .initialize()
        .await
        .map_err(|e| CliError::LedgerOpen(path.to_path_buf(), e))?;
    Ok(ledger)
}

/// Opens an existing ledger for reading; `None` when there is no database yet.
async fn open_ledger_if_exists(path: &Path) -> Result<Option<SqliteLedger>, CliError> {
    if !SqliteLedger::exists(path) {
        log::debug!("Ledger '{}' does not exist", path.display());
        return Ok(None);
    }
    let ledger = SqliteLedger::open_existing(path)
        .await
        .map_err(|e| CliError::LedgerOpen(path.to_path_buf(), e))?;
    ledger
        .initialize()
        .await
        .map_err(|e| CliError::LedgerOpen(path.to_path_buf(), e))?;
    Ok(Some(ledger))
}
