use super::open_ledger;
use crate::argparse::RecordArgs;
use log::info;
use sat_tracker::CliError;
use tracker_common::{CoinGeckoClient, EntryRecorder, SqliteLedger, TrackerConfig};

pub async fn handle_record_command(
    args: RecordArgs,
    config: &TrackerConfig,
) -> Result<(), CliError> {
    let path = &config.ledger.database_path;
    if !SqliteLedger::exists(path) {
        info!("Database not found. Creating '{}'...", path.display());
    }

    let price_source = CoinGeckoClient::new(&config.price).map_err(CliError::PriceClient)?;
    let ledger = open_ledger(path).await?;

    let result = EntryRecorder::new(&ledger, &price_source)
        .with_strict_last_total(config.ledger.strict_last_total)
        .record_entry(args.amount)
        .await;
    ledger.close().await;

    let recorded = result?;
    println!("✓ {}", recorded.summary(&config.price.fiat_code));
    Ok(())
}
