//! The ledger write path: price lookup, cumulative total, persisted row.

use crate::ledger::{LedgerEntry, LedgerStore, NewEntry};
use crate::price::PriceSource;
use crate::{fiat_value, format_fiat, units_as_coin_string, UnitAmount};
use log::{info, warn};

/// Why a recording did not produce a ledger row.
#[derive(Debug)]
pub enum RecordError {
    InvalidAmount(String),
    PriceUnavailable,
    Storage(anyhow::Error),
}

impl std::fmt::Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordError::InvalidAmount(reason) => write!(f, "{}", reason),
            RecordError::PriceUnavailable => {
                write!(f, "Cannot add entry without a current price")
            }
            RecordError::Storage(e) => write!(f, "Error adding entry: {:#}", e),
        }
    }
}

impl std::error::Error for RecordError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RecordError::Storage(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

/// Parses a user-supplied amount of earned units; only positive integers pass.
pub fn parse_earned_units(input: &str) -> Result<UnitAmount, RecordError> {
    let value: i64 = input
        .trim()
        .parse()
        .map_err(|_| RecordError::InvalidAmount(format!("Invalid satoshi amount: {}", input)))?;
    if value <= 0 {
        return Err(RecordError::InvalidAmount(
            "Satoshi amount must be greater than 0".to_string(),
        ));
    }
    Ok(value as UnitAmount)
}

/// Outcome of a successful recording.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEntry {
    pub entry: LedgerEntry,
    pub previous_total: UnitAmount,
}

impl RecordedEntry {
    /// Human-readable confirmation, `fiat_code` as configured (e.g. "eur").
    pub fn summary(&self, fiat_code: &str) -> String {
        let fiat = fiat_code.to_uppercase();
        format!(
            "Entry added successfully!\n  Earned: {} sat\n  Price: {} {}\n  Total: {} sat ({} coin)\n  Value: {} {}",
            self.entry.earned_units,
            format_fiat(self.entry.unit_price, 2),
            fiat,
            self.entry.cumulative_units,
            units_as_coin_string(self.entry.cumulative_units),
            format_fiat(self.entry.fiat_value, 2),
            fiat,
        )
    }
}

pub struct EntryRecorder<'a, S: LedgerStore + ?Sized, P: PriceSource + ?Sized> {
    store: &'a S,
    price_source: &'a P,
    strict_last_total: bool,
}

impl<'a, S: LedgerStore + ?Sized, P: PriceSource + ?Sized> EntryRecorder<'a, S, P> {
    pub fn new(store: &'a S, price_source: &'a P) -> Self {
        Self {
            store,
            price_source,
            strict_last_total: false,
        }
    }

    /// When set, an unreadable last total fails the recording instead of
    /// continuing from 0.
    pub fn with_strict_last_total(mut self, strict: bool) -> Self {
        self.strict_last_total = strict;
        self
    }

    /// Records `earned_units`. The price is resolved before the ledger is
    /// read, and nothing is written unless every prior step succeeded.
    pub async fn record_entry(&self, earned_units: UnitAmount) -> Result<RecordedEntry, RecordError> {
        if earned_units == 0 {
            return Err(RecordError::InvalidAmount(
                "Satoshi amount must be greater than 0".to_string(),
            ));
        }

        let unit_price = self
            .price_source
            .current_unit_price()
            .await
            .ok_or(RecordError::PriceUnavailable)?;
        info!("Current price: {}", format_fiat(unit_price, 2));

        let previous_total = self.last_total().await?;
        let cumulative_units = previous_total.checked_add(earned_units).ok_or_else(|| {
            RecordError::InvalidAmount(format!(
                "Satoshi amount {} overflows the running total {}",
                earned_units, previous_total
            ))
        })?;

        let new_entry = NewEntry {
            earned_units,
            unit_price,
            cumulative_units,
            fiat_value: fiat_value(cumulative_units, unit_price),
        };
        let entry = self
            .store
            .append(&new_entry)
            .await
            .map_err(RecordError::Storage)?;

        Ok(RecordedEntry {
            entry,
            previous_total,
        })
    }

    // A read failure is indistinguishable from an empty ledger in lenient
    // mode and restarts the running total at 0.
    async fn last_total(&self) -> Result<UnitAmount, RecordError> {
        match self.store.last_cumulative_units().await {
            Ok(total) => Ok(total),
            Err(e) if self.strict_last_total => Err(RecordError::Storage(e)),
            Err(e) => {
                warn!(
                    "Could not read last cumulative total, continuing from 0 (the new total may be wrong if the ledger is damaged): {:#}",
                    e
                );
                Ok(0)
            }
        }
    }
}
