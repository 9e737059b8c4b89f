//! Shared building blocks for the cityweather ingestion pipeline:
//! credentials, locations, date ranges and the observation row.

pub mod config;
pub mod error;
pub mod location;
pub mod observation;

pub use config::{Credentials, DatabaseConfig, MySqlConfig, SqliteConfig, ValidationResult};
pub use error::{ConfigError, DateRangeError, LocationError};
pub use location::{DateRange, Location, LocationRegistry};
pub use observation::{FieldValue, ObservationDate, OwnedFieldValue, WeatherRow};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `info`, or `debug` when `verbose`.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}
