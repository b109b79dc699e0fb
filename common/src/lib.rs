pub mod config;
pub mod ledger;
pub mod price;
pub mod recorder;
pub mod report;

pub use config::{LedgerConfig, PriceConfig, ReportConfig, TrackerConfig};
pub use ledger::{LedgerEntry, LedgerStore, NewEntry, SqliteLedger};
pub use price::{CoinGeckoClient, PriceSource};
pub use recorder::{parse_earned_units, EntryRecorder, RecordError, RecordedEntry};
pub use report::{generate_report, render_chart, ReportOutcome, ReportSummary};

/// Smallest-denomination amount (satoshis).
pub type UnitAmount = u64;

pub const UNITS_PER_COIN: UnitAmount = 100_000_000;
pub const COIN_DECIMALS: u8 = 8;

/// Fiat value of `cumulative_units` at `unit_price` per whole coin.
pub fn fiat_value(cumulative_units: UnitAmount, unit_price: f64) -> f64 {
    (cumulative_units as f64 / UNITS_PER_COIN as f64) * unit_price
}

pub fn units_as_coin_string(amount: UnitAmount) -> String {
    if amount == 0 {
        return "0.0".to_string();
    }
    format!(
        "{}.{:0>width$}",
        amount / UNITS_PER_COIN,
        amount % UNITS_PER_COIN,
        width = COIN_DECIMALS as usize
    )
}

/// Formats a fiat amount with thousands separators, e.g. `50,000.00`.
pub fn format_fiat(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && formatted.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}
