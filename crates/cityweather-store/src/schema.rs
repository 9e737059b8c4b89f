//! SQL for the `weather_data` table.
//!
//! Table and column names are compile-time constants; only values are bound.

use cityweather_core::observation::{is_text_column, MEASUREMENT_COLUMNS};

pub const TABLE: &str = "weather_data";

/// SQL flavour of a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    MySql,
}

impl Dialect {
    fn column_type(&self, column: &str) -> &'static str {
        match (self, is_text_column(column)) {
            (_, true) => "TEXT",
            (Dialect::Sqlite, false) => "REAL",
            (Dialect::MySql, false) => "DOUBLE",
        }
    }
}

pub fn create_table(dialect: Dialect) -> String {
    let measurements: String = MEASUREMENT_COLUMNS
        .iter()
        .map(|c| format!("    {c} {},\n", dialect.column_type(c)))
        .collect();

    match dialect {
        Dialect::Sqlite => format!(
            "CREATE TABLE IF NOT EXISTS {TABLE} (\n\
             \x20   id INTEGER PRIMARY KEY AUTOINCREMENT,\n\
             \x20   name TEXT NOT NULL,\n\
             \x20   datetime TEXT NOT NULL,\n\
             {measurements}\
             \x20   source TEXT,\n\
             \x20   fetched_at TEXT DEFAULT CURRENT_TIMESTAMP,\n\
             \x20   UNIQUE (name, datetime)\n\
             );\n\
             CREATE INDEX IF NOT EXISTS idx_{TABLE}_datetime ON {TABLE}(datetime);"
        ),
        Dialect::MySql => format!(
            "CREATE TABLE IF NOT EXISTS {TABLE} (\n\
             \x20   id BIGINT AUTO_INCREMENT PRIMARY KEY,\n\
             \x20   name VARCHAR(100) NOT NULL,\n\
             \x20   datetime DATE NOT NULL,\n\
             {measurements}\
             \x20   source VARCHAR(80),\n\
             \x20   fetched_at DATETIME DEFAULT CURRENT_TIMESTAMP,\n\
             \x20   UNIQUE KEY city_date_unique (name, datetime)\n\
             ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4"
        ),
    }
}

/// Columns bound by an insert, in bind order.
fn insert_columns() -> Vec<&'static str> {
    let mut columns = Vec::with_capacity(MEASUREMENT_COLUMNS.len() + 3);
    columns.push("name");
    columns.push("datetime");
    columns.extend(MEASUREMENT_COLUMNS);
    columns.push("source");
    columns
}

/// Number of `?` placeholders in [`insert`] and [`upsert`].
pub fn insert_param_count() -> usize {
    MEASUREMENT_COLUMNS.len() + 3
}

/// Plain insert; `fetched_at` is stamped by the database.
pub fn insert() -> String {
    let columns = insert_columns();
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT INTO {TABLE} ({}, fetched_at) VALUES ({placeholders}, CURRENT_TIMESTAMP)",
        columns.join(", ")
    )
}

/// Insert that overwrites measurements, `source` and `fetched_at` on a
/// (name, datetime) collision. `id`, `name` and `datetime` are untouched.
pub fn upsert(dialect: Dialect) -> String {
    let overwritten = MEASUREMENT_COLUMNS.iter().copied().chain(["source"]);
    let assignments: Vec<String> = match dialect {
        Dialect::Sqlite => overwritten.map(|c| format!("{c} = excluded.{c}")).collect(),
        Dialect::MySql => overwritten.map(|c| format!("{c} = VALUES({c})")).collect(),
    };

    let conflict = match dialect {
        Dialect::Sqlite => "ON CONFLICT(name, datetime) DO UPDATE SET",
        Dialect::MySql => "ON DUPLICATE KEY UPDATE",
    };

    format!(
        "{} {conflict} {}, fetched_at = CURRENT_TIMESTAMP",
        insert(),
        assignments.join(", ")
    )
}

pub fn delete_range() -> String {
    format!("DELETE FROM {TABLE} WHERE name = ? AND datetime BETWEEN ? AND ?")
}

/// Select for one location; columns are `id`, `name`, `datetime`, the
/// measurements, `source`, `fetched_at`.
pub fn select_for_name() -> String {
    format!(
        "SELECT id, name, datetime, {}, source, fetched_at FROM {TABLE} WHERE name = ? ORDER BY datetime, id",
        MEASUREMENT_COLUMNS.join(", ")
    )
}

pub fn count_for_name() -> String {
    format!("SELECT COUNT(*) FROM {TABLE} WHERE name = ?")
}
