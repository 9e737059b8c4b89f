//! Startup errors of an ingestion run.
//!
//! Per-location failures never surface here; they are recorded in the
//! run summary instead.

use thiserror::Error;

use cityweather_core::{ConfigError, DateRangeError, LocationError};
use cityweather_fetch::FetchError;
use cityweather_store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid location list: {0}")]
    Location(#[from] LocationError),

    #[error("Invalid date range: {0}")]
    DateRange(#[from] DateRangeError),

    #[error("Failed to set up the weather client: {0}")]
    Client(#[from] FetchError),

    #[error("Database setup failed: {0}")]
    Store(#[from] StoreError),
}

impl AppError {
    /// Hint printed below the error on the console.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Config(e) => e.user_message(),
            Self::Location(_) => "Check the --city values.",
            Self::DateRange(_) => "Dates must be YYYY-MM-DD with --start on or before --end.",
            Self::Client(_) => "Check base_url in the credentials file.",
            Self::Store(_) => "Check that the database is reachable and the credentials are correct.",
        }
    }
}
