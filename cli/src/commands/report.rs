use super::open_ledger_if_exists;
use crate::argparse::ReportArgs;
use sat_tracker::{CliError, NO_DATA_MESSAGE};
use tracker_common::{generate_report, ReportOutcome, TrackerConfig};

pub async fn handle_report_command(
    args: ReportArgs,
    mut config: TrackerConfig,
) -> Result<(), CliError> {
    if let Some(output) = args.output {
        config.report.output_path = output;
    }

    let Some(ledger) = open_ledger_if_exists(&config.ledger.database_path).await? else {
        println!("{}", NO_DATA_MESSAGE);
        return Ok(());
    };

    let outcome = generate_report(&ledger, &config.report, &config.price.fiat_code).await;
    ledger.close().await;

    match outcome.map_err(CliError::Report)? {
        ReportOutcome::NoData => println!("{}", NO_DATA_MESSAGE),
        ReportOutcome::Rendered {
            summary,
            output_path,
        } => {
            println!("✓ Chart saved as '{}'", output_path.display());
            println!();
            println!("{}", summary.describe(&config.price.fiat_code));
        }
    }
    Ok(())
}
