use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracker_common::{parse_earned_units, UnitAmount};

#[derive(Parser)]
#[command(
    name = "sat-tracker",
    about = "Track satoshi earnings and their fiat value",
    version,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Ledger database file, overrides the configuration
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Pick which subcommand to use
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the ledger database and schema
    Init,
    /// Record earned satoshis at the current price
    Record(RecordArgs),
    /// Render the ledger chart and print statistics
    Report(ReportArgs),
    /// List all ledger entries
    List,
}

#[derive(Args)]
pub struct RecordArgs {
    /// Satoshis earned, a positive integer
    #[arg(value_name = "SATOSHI", value_parser = parse_amount)]
    pub amount: UnitAmount,
}

#[derive(Args)]
pub struct ReportArgs {
    /// Chart output file, overrides the configuration
    #[arg(long)]
    pub output: Option<PathBuf>,
}

fn parse_amount(s: &str) -> Result<UnitAmount, String> {
    parse_earned_units(s).map_err(|e| e.to_string())
}

/// Parses the command line. Invalid input exits with status 1, help and
/// version requests with status 0.
pub fn parse_args() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            eprintln!("Example: sat-tracker record 1500");
            std::process::exit(1);
        }
    }
}
