//! Observation storage trait and error types.
//!
//! `ObservationStore` abstracts over the SQLite and MySQL implementations of
//! the shared `weather_data` table.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use cityweather_core::{DateRange, Location, WeatherRow};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("MySQL error: {0}")]
    MySql(#[from] sqlx::Error),

    /// A persisted row could not be mapped back to a `WeatherRow`.
    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    /// A row handed to `replace_range` belongs to another location.
    #[error("Row for '{found}' passed while replacing '{expected}'")]
    ForeignRow { expected: String, found: String },

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::CorruptRow(message.into())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// How a run writes its rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Insert, overwriting measurements on a (name, datetime) collision.
    #[default]
    Upsert,
    /// Delete the location's rows in the requested range, then insert.
    Replace,
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteMode::Upsert => f.write_str("upsert"),
            WriteMode::Replace => f.write_str("replace"),
        }
    }
}

impl FromStr for WriteMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "upsert" => Ok(WriteMode::Upsert),
            "replace" => Ok(WriteMode::Replace),
            other => Err(format!("unknown write mode '{other}', expected upsert or replace")),
        }
    }
}

/// A row as persisted, with its surrogate id and write timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
    pub id: i64,
    pub row: WeatherRow,
    pub fetched_at: Option<NaiveDateTime>,
}

/// Storage backend for normalized observations.
///
/// Every write is a single transaction: it either lands completely or not
/// at all.
#[async_trait]
pub trait ObservationStore: Send + Sync {
    /// Short backend label for logs, e.g. `sqlite` or `mysql`.
    fn backend_name(&self) -> &'static str;

    /// Create the `weather_data` table if it does not exist. Idempotent.
    async fn ensure_schema(&self) -> StoreResult<()>;

    /// Insert rows, overwriting measurements, `source` and `fetched_at` of
    /// any existing (name, datetime) row. Returns the number of input rows.
    async fn upsert(&self, rows: &[WeatherRow]) -> StoreResult<usize>;

    /// Delete `location`'s rows dated within `range`, then insert `rows`.
    async fn replace_range(
        &self,
        location: &Location,
        range: &DateRange,
        rows: &[WeatherRow],
    ) -> StoreResult<usize>;

    /// Persisted rows for `location`, oldest first.
    async fn rows_for(&self, location: &Location) -> StoreResult<Vec<StoredRow>>;

    /// Number of persisted rows for `location`.
    async fn count_rows(&self, location: &Location) -> StoreResult<u64>;

    /// Write with the given mode.
    async fn write(
        &self,
        mode: WriteMode,
        location: &Location,
        range: &DateRange,
        rows: &[WeatherRow],
    ) -> StoreResult<usize> {
        match mode {
            WriteMode::Upsert => self.upsert(rows).await,
            WriteMode::Replace => self.replace_range(location, range, rows).await,
        }
    }
}

/// Reject rows that do not belong to `location`.
pub(crate) fn check_rows_belong(location: &Location, rows: &[WeatherRow]) -> StoreResult<()> {
    match rows.iter().find(|r| r.name != location.name()) {
        Some(row) => Err(StoreError::ForeignRow {
            expected: location.name().to_string(),
            found: row.name.clone(),
        }),
        None => Ok(()),
    }
}
