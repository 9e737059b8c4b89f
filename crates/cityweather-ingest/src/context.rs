//! Everything one run needs, built explicitly at startup.

use std::sync::Arc;
use std::time::Duration;

use cityweather_core::{Credentials, DateRange, LocationRegistry};
use cityweather_fetch::{ContentType, DayFetcher, ResponseCache, TimelineClient};
use cityweather_store::{ObservationStore, WriteMode};

use crate::error::AppError;

/// Pause between two consecutive locations.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(1000);

/// What to ingest and how.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub locations: LocationRegistry,
    pub range: DateRange,
    pub content_type: ContentType,
    pub mode: WriteMode,
    pub delay: Duration,
}

impl RunSettings {
    pub fn new(locations: LocationRegistry, range: DateRange) -> Self {
        Self {
            locations,
            range,
            content_type: ContentType::Json,
            mode: WriteMode::Upsert,
            delay: DEFAULT_DELAY,
        }
    }
}

/// Fetcher, store, optional cache and settings of one run.
pub struct IngestContext {
    pub fetcher: Arc<dyn DayFetcher>,
    pub store: Arc<dyn ObservationStore>,
    pub cache: Option<ResponseCache>,
    pub settings: RunSettings,
}

impl IngestContext {
    pub fn new(
        fetcher: Arc<dyn DayFetcher>,
        store: Arc<dyn ObservationStore>,
        settings: RunSettings,
    ) -> Self {
        Self {
            fetcher,
            store,
            cache: None,
            settings,
        }
    }

    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Build the HTTP client, connect the configured database and make sure
    /// the table exists. Any failure here aborts the run.
    pub async fn from_credentials(
        credentials: &Credentials,
        settings: RunSettings,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = TimelineClient::new(&credentials.base_url, &credentials.api_key, timeout)?;

        let store = cityweather_store::connect(&credentials.database).await?;
        store.ensure_schema().await?;
        tracing::info!(backend = store.backend_name(), "Schema ready");

        Ok(Self::new(Arc::new(client), store, settings))
    }
}
