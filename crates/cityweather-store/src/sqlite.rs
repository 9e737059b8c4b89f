//! SQLite implementation of [`ObservationStore`].

use async_trait::async_trait;
use chrono::NaiveDateTime;
use parking_lot::Mutex;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use std::path::Path;

use cityweather_core::location::parse_date;
use cityweather_core::observation::{is_text_column, MEASUREMENT_COLUMNS};
use cityweather_core::{
    DateRange, FieldValue, Location, ObservationDate, OwnedFieldValue, WeatherRow,
};

use crate::backend::{check_rows_belong, ObservationStore, StoreResult, StoredRow};
use crate::schema::{self, Dialect};

/// `fetched_at` as written by SQLite's `CURRENT_TIMESTAMP`.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// SQLite-backed observation store.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database file. Missing parent directories are created.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        tracing::debug!(path = %path.display(), "Opened SQLite store");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store.
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(&self) -> StoreResult<()> {
        self.conn.lock().execute_batch(&schema::create_table(Dialect::Sqlite))?;
        Ok(())
    }

    fn upsert_rows(&self, rows: &[WeatherRow]) -> StoreResult<usize> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&schema::upsert(Dialect::Sqlite))?;
            for row in rows {
                stmt.execute(params_from_iter(row_params(row)))?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    fn replace_rows(
        &self,
        location: &Location,
        range: &DateRange,
        rows: &[WeatherRow],
    ) -> StoreResult<usize> {
        check_rows_belong(location, rows)?;

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let deleted = tx.execute(
            &schema::delete_range(),
            params![location.name(), range.start().to_string(), range.end().to_string()],
        )?;
        {
            // Rows outside the range may still collide, so the insert merges.
            let mut stmt = tx.prepare(&schema::upsert(Dialect::Sqlite))?;
            for row in rows {
                stmt.execute(params_from_iter(row_params(row)))?;
            }
        }
        tx.commit()?;

        tracing::debug!(location = %location, deleted, inserted = rows.len(), "Replaced range");
        Ok(rows.len())
    }

    fn select_rows(&self, location: &Location) -> StoreResult<Vec<StoredRow>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&schema::select_for_name())?;
        let rows = stmt
            .query_map([location.name()], row_to_stored)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn count(&self, location: &Location) -> StoreResult<u64> {
        let count: i64 = self.conn.lock().query_row(
            &schema::count_for_name(),
            [location.name()],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

#[async_trait]
impl ObservationStore for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn ensure_schema(&self) -> StoreResult<()> {
        self.init_schema()
    }

    async fn upsert(&self, rows: &[WeatherRow]) -> StoreResult<usize> {
        self.upsert_rows(rows)
    }

    async fn replace_range(
        &self,
        location: &Location,
        range: &DateRange,
        rows: &[WeatherRow],
    ) -> StoreResult<usize> {
        self.replace_rows(location, range, rows)
    }

    async fn rows_for(&self, location: &Location) -> StoreResult<Vec<StoredRow>> {
        self.select_rows(location)
    }

    async fn count_rows(&self, location: &Location) -> StoreResult<u64> {
        self.count(location)
    }
}

/// Bind values in `schema::insert` column order.
fn row_params(row: &WeatherRow) -> Vec<Value> {
    let mut values = Vec::with_capacity(schema::insert_param_count());
    values.push(Value::Text(row.name.clone()));
    values.push(Value::Text(row.datetime.to_string()));
    for field in row.measurements() {
        values.push(match field {
            FieldValue::Number(Some(n)) => Value::Real(n),
            FieldValue::Text(Some(s)) => Value::Text(s.to_string()),
            FieldValue::Number(None) | FieldValue::Text(None) => Value::Null,
        });
    }
    values.push(Value::Text(row.source.clone()));
    values
}

fn row_to_stored(r: &rusqlite::Row) -> rusqlite::Result<StoredRow> {
    let id: i64 = r.get(0)?;
    let name: String = r.get(1)?;
    let raw_date: String = r.get(2)?;

    let datetime = match parse_date(&raw_date) {
        Some(date) => ObservationDate::Parsed(date),
        None => ObservationDate::Raw(raw_date),
    };

    let mut row = WeatherRow {
        name,
        datetime,
        ..Default::default()
    };

    for (i, column) in MEASUREMENT_COLUMNS.iter().enumerate() {
        let idx = 3 + i;
        let value = if is_text_column(column) {
            OwnedFieldValue::Text(r.get(idx)?)
        } else {
            OwnedFieldValue::Number(r.get(idx)?)
        };
        row.set_measurement(column, value);
    }

    let tail = 3 + MEASUREMENT_COLUMNS.len();
    let source: Option<String> = r.get(tail)?;
    row.source = source.unwrap_or_default();

    let fetched_at: Option<String> = r.get(tail + 1)?;
    let fetched_at =
        fetched_at.and_then(|s| NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT).ok());

    Ok(StoredRow { id, row, fetched_at })
}
