//! Persistence for normalized observations: one `weather_data` table, kept
//! in SQLite or MySQL.

pub mod backend;
pub mod mysql;
pub mod schema;
pub mod sqlite;

use std::sync::Arc;

use cityweather_core::DatabaseConfig;

pub use backend::{ObservationStore, StoreError, StoreResult, StoredRow, WriteMode};
pub use mysql::MySqlStore;
pub use sqlite::SqliteStore;

/// Open the configured backend. The schema is not touched.
pub async fn connect(config: &DatabaseConfig) -> StoreResult<Arc<dyn ObservationStore>> {
    match config {
        DatabaseConfig::MySql(mysql) => Ok(Arc::new(MySqlStore::connect(mysql).await?)),
        DatabaseConfig::Sqlite(sqlite) => Ok(Arc::new(SqliteStore::open(&sqlite.path)?)),
    }
}
