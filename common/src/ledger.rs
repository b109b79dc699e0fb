//! Append-only earnings ledger backed by a single SQLite table.
//!
//! Every command opens the database, does its work and closes it again, so a
//! [`SqliteLedger`] is short-lived and limited to one connection.

use crate::UnitAmount;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::{Path, PathBuf};

/// One persisted ledger row.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub earned_units: UnitAmount,
    pub unit_price: f64,
    pub cumulative_units: UnitAmount,
    pub fiat_value: f64,
}

/// Row data supplied by the caller; `id` and `timestamp` are assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub earned_units: UnitAmount,
    pub unit_price: f64,
    pub cumulative_units: UnitAmount,
    pub fiat_value: f64,
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Creates the backing table if it does not exist yet.
    async fn initialize(&self) -> Result<()>;

    /// Cumulative units of the most recent row, or 0 for an empty ledger.
    async fn last_cumulative_units(&self) -> Result<UnitAmount>;

    /// Inserts one row in a single statement and returns it as stored.
    async fn append(&self, entry: &NewEntry) -> Result<LedgerEntry>;

    /// All rows by ascending id.
    async fn all_entries_ordered(&self) -> Result<Vec<LedgerEntry>>;
}

pub struct SqliteLedger {
    pool: SqlitePool,
    path: PathBuf,
}

impl std::fmt::Debug for SqliteLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteLedger")
            .field("path", &self.path)
            .field("pool", &"<SqlitePool>")
            .finish()
    }
}

impl SqliteLedger {
    /// Opens the ledger at `path`, creating the database file if needed.
    pub async fn open(path: &Path) -> Result<Self> {
        Self::connect(path, true).await
    }

    /// Opens an already existing ledger; never creates the file.
    pub async fn open_existing(path: &Path) -> Result<Self> {
        Self::connect(path, false).await
    }

    pub fn exists(path: &Path) -> bool {
        path.is_file()
    }

    async fn connect(path: &Path, create_if_missing: bool) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(create_if_missing);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open ledger database: {}", path.display()))?;
        Ok(Self {
            pool,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn entry_count(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM entries")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count ledger entries")?;
        Ok(row.get::<i64, _>("count").max(0) as u64)
    }

    pub async fn close(self) {
        self.pool.close().await;
    }

    /// Test helper method to access the underlying pool
    #[cfg(test)]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn entry_from_row(row: &SqliteRow) -> Result<LedgerEntry> {
    let timestamp: NaiveDateTime = row.try_get("timestamp")?;
    Ok(LedgerEntry {
        id: row.try_get("id")?,
        timestamp: timestamp.and_utc(),
        earned_units: units_from_column(row.try_get("earned_units")?, "earned_units")?,
        unit_price: row.try_get("unit_price")?,
        cumulative_units: units_from_column(row.try_get("cumulative_units")?, "cumulative_units")?,
        fiat_value: row.try_get("fiat_value")?,
    })
}

fn units_from_column(value: i64, column: &str) -> Result<UnitAmount> {
    UnitAmount::try_from(value)
        .map_err(|_| anyhow::anyhow!("Negative value {} in column {}", value, column))
}

fn units_to_column(value: UnitAmount, column: &str) -> Result<i64> {
    i64::try_from(value)
        .map_err(|_| anyhow::anyhow!("Value {} too large for column {}", value, column))
}

#[async_trait]
impl LedgerStore for SqliteLedger {
    async fn initialize(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to initialize ledger schema")?;
        Ok(())
    }

    async fn last_cumulative_units(&self) -> Result<UnitAmount> {
        let row = sqlx::query("SELECT cumulative_units FROM entries ORDER BY id DESC LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .context("Failed to read last cumulative total")?;
        match row {
            Some(row) => units_from_column(row.try_get("cumulative_units")?, "cumulative_units"),
            None => Ok(0),
        }
    }

    async fn append(&self, entry: &NewEntry) -> Result<LedgerEntry> {
        let row = sqlx::query(
            "INSERT INTO entries (earned_units, unit_price, cumulative_units, fiat_value)
             VALUES (?, ?, ?, ?)
             RETURNING id, timestamp, earned_units, unit_price, cumulative_units, fiat_value",
        )
        .bind(units_to_column(entry.earned_units, "earned_units")?)
        .bind(entry.unit_price)
        .bind(units_to_column(entry.cumulative_units, "cumulative_units")?)
        .bind(entry.fiat_value)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert ledger entry")?;
        entry_from_row(&row)
    }

    async fn all_entries_ordered(&self) -> Result<Vec<LedgerEntry>> {
        let rows = sqlx::query(
            "SELECT id, timestamp, earned_units, unit_price, cumulative_units, fiat_value
             FROM entries
             ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to load ledger entries")?;
        rows.iter().map(entry_from_row).collect()
    }
}
