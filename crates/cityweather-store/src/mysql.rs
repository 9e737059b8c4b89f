//! MySQL implementation of [`ObservationStore`].

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::mysql::{MySql, MySqlArguments, MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::query::Query;
use sqlx::Row;
use std::time::Duration;

use cityweather_core::observation::{is_text_column, MEASUREMENT_COLUMNS};
use cityweather_core::{
    DateRange, FieldValue, Location, MySqlConfig, ObservationDate, OwnedFieldValue, WeatherRow,
};

use crate::backend::{check_rows_belong, ObservationStore, StoreError, StoreResult, StoredRow};
use crate::schema::{self, Dialect};

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// MySQL-backed observation store over a single-connection pool.
#[derive(Debug, Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    /// Connect using the credentials file's `mysql` block.
    pub async fn connect(config: &MySqlConfig) -> StoreResult<Self> {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database)
            .charset("utf8mb4");

        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(options)
            .await?;

        tracing::info!(db = %config.target(), "Connected to MySQL");
        Ok(Self { pool })
    }
}

#[async_trait]
impl ObservationStore for MySqlStore {
    fn backend_name(&self) -> &'static str {
        "mysql"
    }

    async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::query(&schema::create_table(Dialect::MySql))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn upsert(&self, rows: &[WeatherRow]) -> StoreResult<usize> {
        let sql = schema::upsert(Dialect::MySql);
        let mut tx = self.pool.begin().await?;
        for row in rows {
            bind_row(sqlx::query(&sql), row).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(rows.len())
    }

    async fn replace_range(
        &self,
        location: &Location,
        range: &DateRange,
        rows: &[WeatherRow],
    ) -> StoreResult<usize> {
        check_rows_belong(location, rows)?;

        let delete = schema::delete_range();
        let sql = schema::upsert(Dialect::MySql);
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query(&delete)
            .bind(location.name())
            .bind(range.start())
            .bind(range.end())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        for row in rows {
            bind_row(sqlx::query(&sql), row).execute(&mut *tx).await?;
        }
        tx.commit().await?;

        tracing::debug!(location = %location, deleted, inserted = rows.len(), "Replaced range");
        Ok(rows.len())
    }

    async fn rows_for(&self, location: &Location) -> StoreResult<Vec<StoredRow>> {
        let sql = schema::select_for_name();
        let rows = sqlx::query(&sql)
            .bind(location.name())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_stored).collect()
    }

    async fn count_rows(&self, location: &Location) -> StoreResult<u64> {
        let sql = schema::count_for_name();
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(location.name())
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

/// Bind values in `schema::insert` column order.
///
/// A date that never parsed is bound as text; MySQL rejects it and the
/// surrounding transaction rolls back.
fn bind_row<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    row: &'q WeatherRow,
) -> Query<'q, MySql, MySqlArguments> {
    let mut query = query.bind(row.name.as_str());
    query = match &row.datetime {
        ObservationDate::Parsed(date) => query.bind(*date),
        ObservationDate::Raw(raw) => query.bind(raw.as_str()),
    };
    for field in row.measurements() {
        query = match field {
            FieldValue::Number(n) => query.bind(n),
            FieldValue::Text(t) => query.bind(t),
        };
    }
    query.bind(row.source.as_str())
}

fn row_to_stored(r: &MySqlRow) -> StoreResult<StoredRow> {
    let id: i64 = r.try_get("id")?;
    let name: String = r.try_get("name")?;
    let date: Option<NaiveDate> = r.try_get("datetime")?;
    let date = date.ok_or_else(|| StoreError::corrupt(format!("row {id} has no datetime")))?;

    let mut row = WeatherRow {
        name,
        datetime: ObservationDate::Parsed(date),
        ..Default::default()
    };

    for column in MEASUREMENT_COLUMNS {
        let value = if is_text_column(column) {
            OwnedFieldValue::Text(r.try_get(column)?)
        } else {
            OwnedFieldValue::Number(r.try_get(column)?)
        };
        row.set_measurement(column, value);
    }

    let source: Option<String> = r.try_get("source")?;
    row.source = source.unwrap_or_default();
    let fetched_at: Option<NaiveDateTime> = r.try_get("fetched_at")?;

    Ok(StoredRow { id, row, fetched_at })
}
