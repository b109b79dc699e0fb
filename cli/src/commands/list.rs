use super::open_ledger_if_exists;
use sat_tracker::{CliError, NO_DATA_MESSAGE};
use tabular::{Row, Table};
use tracker_common::{format_fiat, LedgerEntry, LedgerStore, TrackerConfig};

pub async fn handle_list_command(config: &TrackerConfig) -> Result<(), CliError> {
    let Some(ledger) = open_ledger_if_exists(&config.ledger.database_path).await? else {
        println!("{}", NO_DATA_MESSAGE);
        return Ok(());
    };

    let entries = ledger.all_entries_ordered().await;
    ledger.close().await;
    let entries = entries.map_err(CliError::Report)?;

    if entries.is_empty() {
        println!("{}", NO_DATA_MESSAGE);
        return Ok(());
    }
    print!("{}", entries_table(&entries, &config.price.fiat_code));
    Ok(())
}

fn entries_table(entries: &[LedgerEntry], fiat_code: &str) -> Table {
    let fiat = fiat_code.to_uppercase();
    #[allow(clippy::literal_string_with_formatting_args)]
    let mut table = Table::new("{:>}  {:<}  {:>}  {:>}  {:>}  {:>}").with_row(Row::from_cells(
        [
            "Id".to_string(),
            "Timestamp (UTC)".to_string(),
            "Earned sat".to_string(),
            format!("Price {}", fiat),
            "Total sat".to_string(),
            format!("Value {}", fiat),
        ]
        .iter()
        .cloned(),
    ));

    for entry in entries {
        table.add_row(
            Row::new()
                .with_cell(entry.id)
                .with_cell(entry.timestamp.format("%Y-%m-%d %H:%M:%S"))
                .with_cell(entry.earned_units)
                .with_cell(format_fiat(entry.unit_price, 2))
                .with_cell(entry.cumulative_units)
                .with_cell(format_fiat(entry.fiat_value, 2)),
        );
    }
    table
}
