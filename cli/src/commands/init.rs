use super::open_ledger;
use sat_tracker::CliError;
use tracker_common::TrackerConfig;

pub async fn handle_init_command(config: &TrackerConfig) -> Result<(), CliError> {
    let path = &config.ledger.database_path;
    let ledger = open_ledger(path).await?;
    ledger.close().await;

    println!("✓ Database '{}' initialized successfully", path.display());
    Ok(())
}
