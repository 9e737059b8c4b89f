//! Sequential fetch, normalize and write loop over the configured locations.

use std::fmt;
use tracing::instrument;

use cityweather_core::Location;
use cityweather_fetch::{normalize_days, ContentType};

use crate::context::IngestContext;

/// What happened to one location.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationOutcome {
    /// Rows written.
    Written(usize),
    /// Upstream answered but had no usable day records.
    Empty,
    FetchFailed(String),
    WriteFailed(String),
}

impl LocationOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::FetchFailed(_) | Self::WriteFailed(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationReport {
    pub location: String,
    pub outcome: LocationOutcome,
}

/// Per-location outcomes of a run, in processing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub reports: Vec<LocationReport>,
}

impl RunSummary {
    pub fn rows_written(&self) -> usize {
        self.reports
            .iter()
            .map(|r| match r.outcome {
                LocationOutcome::Written(n) => n,
                _ => 0,
            })
            .sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &LocationReport> {
        self.reports.iter().filter(|r| r.outcome.is_failure())
    }

    pub fn outcome_for(&self, location: &str) -> Option<&LocationOutcome> {
        self.reports.iter().find(|r| r.location == location).map(|r| &r.outcome)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let written = self
            .reports
            .iter()
            .filter(|r| matches!(r.outcome, LocationOutcome::Written(_)))
            .count();
        let empty = self.reports.iter().filter(|r| r.outcome == LocationOutcome::Empty).count();
        write!(
            f,
            "{} locations: {} written ({} rows), {} empty, {} failed",
            self.reports.len(),
            written,
            self.rows_written(),
            empty,
            self.failures().count()
        )
    }
}

/// Runs one ingestion over an [`IngestContext`].
pub struct Pipeline {
    ctx: IngestContext,
}

impl Pipeline {
    pub fn new(ctx: IngestContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &IngestContext {
        &self.ctx
    }

    /// Process every location in order, one at a time. A failing location is
    /// logged and skipped; the delay applies between locations only.
    pub async fn run(&self) -> RunSummary {
        let settings = &self.ctx.settings;
        let total = settings.locations.len();
        tracing::info!(
            locations = total,
            range = %settings.range,
            mode = %settings.mode,
            format = %settings.content_type,
            "Starting ingestion"
        );

        let mut summary = RunSummary::default();
        for (i, location) in settings.locations.iter().enumerate() {
            let outcome = self.process(location).await;
            summary.reports.push(LocationReport {
                location: location.name().to_string(),
                outcome,
            });

            if i + 1 < total && !settings.delay.is_zero() {
                tokio::time::sleep(settings.delay).await;
            }
        }

        tracing::info!("Finished: {}", summary);
        summary
    }

    #[instrument(skip(self, location), fields(location = %location))]
    async fn process(&self, location: &Location) -> LocationOutcome {
        let ctx = &self.ctx;
        let range = &ctx.settings.range;

        let payload = match ctx.fetcher.fetch(location, range, ctx.settings.content_type).await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(kind = e.kind(), "Fetch failed, skipping: {}", e);
                return LocationOutcome::FetchFailed(e.to_string());
            }
        };

        let days = match payload.decode() {
            Ok(days) => days,
            Err(e) => {
                tracing::warn!(kind = e.kind(), "Undecodable payload, skipping: {}", e);
                return LocationOutcome::FetchFailed(e.to_string());
            }
        };

        if let (Some(cache), ContentType::Json) = (&ctx.cache, payload.content_type) {
            cache.write(location, range, &payload.body).await;
        }

        let rows = normalize_days(location, &days);
        if rows.is_empty() {
            tracing::warn!(records = days.len(), "No day records returned");
            return LocationOutcome::Empty;
        }

        match ctx.store.write(ctx.settings.mode, location, range, &rows).await {
            Ok(written) => {
                tracing::info!(rows = written, "Stored rows");
                LocationOutcome::Written(written)
            }
            Err(e) => {
                tracing::error!("Write failed: {}", e);
                LocationOutcome::WriteFailed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::context::RunSettings;
    use async_trait::async_trait;
    use cityweather_core::{DateRange, LocationRegistry, WeatherRow};
    use cityweather_fetch::{DayFetcher, FetchError, RawPayload, ResponseCache};
    use cityweather_store::{
        ObservationStore, SqliteStore, StoreError, StoreResult, StoredRow, WriteMode,
    };
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Canned responses keyed by location name; unknown names get a 404.
    #[derive(Default)]
    struct FakeFetcher {
        bodies: HashMap<String, RawPayload>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        fn with(mut self, name: &str, payload: RawPayload) -> Self {
            self.bodies.insert(name.to_string(), payload);
            self
        }
    }

    #[async_trait]
    impl DayFetcher for FakeFetcher {
        async fn fetch(
            &self,
            location: &Location,
            _range: &DateRange,
            _content_type: ContentType,
        ) -> Result<RawPayload, FetchError> {
            self.calls.lock().unwrap().push(location.name().to_string());
            self.bodies
                .get(location.name())
                .cloned()
                .ok_or_else(|| FetchError::status(404, "unknown location"))
        }
    }

    /// Store that refuses writes for one location.
    struct FlakyStore {
        inner: SqliteStore,
        broken: String,
    }

    #[async_trait]
    impl ObservationStore for FlakyStore {
        fn backend_name(&self) -> &'static str {
            "flaky"
        }

        async fn ensure_schema(&self) -> StoreResult<()> {
            self.inner.ensure_schema().await
        }

        async fn upsert(&self, rows: &[WeatherRow]) -> StoreResult<usize> {
            if rows.iter().any(|r| r.name == self.broken) {
                return Err(StoreError::corrupt("disk full"));
            }
            self.inner.upsert(rows).await
        }

        async fn replace_range(
            &self,
            location: &Location,
            range: &DateRange,
            rows: &[WeatherRow],
        ) -> StoreResult<usize> {
            self.inner.replace_range(location, range, rows).await
        }

        async fn rows_for(&self, location: &Location) -> StoreResult<Vec<StoredRow>> {
            self.inner.rows_for(location).await
        }

        async fn count_rows(&self, location: &Location) -> StoreResult<u64> {
            self.inner.count_rows(location).await
        }
    }

    fn two_days() -> RawPayload {
        RawPayload::json(
            serde_json::json!({
                "days": [
                    {"datetime": "2025-10-05", "temp": 25.0},
                    {"datetime": "2025-10-06", "temp": 26.0}
                ]
            })
            .to_string(),
        )
    }

    fn settings(names: &[&str]) -> RunSettings {
        let mut settings = RunSettings::new(
            LocationRegistry::new(names).unwrap(),
            DateRange::parse("2025-10-05", "2025-10-06").unwrap(),
        );
        settings.delay = Duration::ZERO;
        settings
    }

    async fn sqlite() -> Arc<SqliteStore> {
        let store = SqliteStore::in_memory().unwrap();
        store.ensure_schema().await.unwrap();
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_failed_fetch_does_not_stop_run() {
        let fetcher = Arc::new(FakeFetcher::default().with("Pune,IN", two_days()));
        let store = sqlite().await;
        let ctx = IngestContext::new(
            fetcher.clone(),
            store.clone(),
            settings(&["Delhi,IN", "Pune,IN"]),
        );

        let summary = Pipeline::new(ctx).run().await;

        assert!(matches!(summary.outcome_for("Delhi,IN"), Some(LocationOutcome::FetchFailed(_))));
        assert_eq!(summary.outcome_for("Pune,IN"), Some(&LocationOutcome::Written(2)));
        assert_eq!(*fetcher.calls.lock().unwrap(), vec!["Delhi,IN", "Pune,IN"]);
        let pune = Location::parse("Pune,IN").unwrap();
        assert_eq!(store.count_rows(&pune).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_empty_payload_is_reported() {
        let fetcher = Arc::new(
            FakeFetcher::default()
                .with("Pune,IN", RawPayload::json(r#"{"days": []}"#))
                .with("Goa,IN", RawPayload::json(r#"{"address": "Goa"}"#)),
        );
        let ctx = IngestContext::new(fetcher, sqlite().await, settings(&["Pune,IN", "Goa,IN"]));

        let summary = Pipeline::new(ctx).run().await;

        assert_eq!(summary.outcome_for("Pune,IN"), Some(&LocationOutcome::Empty));
        assert_eq!(summary.outcome_for("Goa,IN"), Some(&LocationOutcome::Empty));
        assert_eq!(summary.rows_written(), 0);
        assert_eq!(summary.failures().count(), 0);
    }

    #[tokio::test]
    async fn test_undecodable_payload_is_fetch_failure() {
        let fetcher =
            Arc::new(FakeFetcher::default().with("Pune,IN", RawPayload::json("<html></html>")));
        let ctx = IngestContext::new(fetcher, sqlite().await, settings(&["Pune,IN"]));

        let summary = Pipeline::new(ctx).run().await;

        assert!(matches!(summary.outcome_for("Pune,IN"), Some(LocationOutcome::FetchFailed(_))));
    }

    #[tokio::test]
    async fn test_write_failure_does_not_stop_run() {
        let fetcher = Arc::new(
            FakeFetcher::default()
                .with("Delhi,IN", two_days())
                .with("Pune,IN", two_days()),
        );
        let store = Arc::new(FlakyStore {
            inner: SqliteStore::in_memory().unwrap(),
            broken: "Delhi,IN".into(),
        });
        store.ensure_schema().await.unwrap();
        let ctx = IngestContext::new(fetcher, store.clone(), settings(&["Delhi,IN", "Pune,IN"]));

        let summary = Pipeline::new(ctx).run().await;

        assert!(matches!(summary.outcome_for("Delhi,IN"), Some(LocationOutcome::WriteFailed(_))));
        assert_eq!(summary.outcome_for("Pune,IN"), Some(&LocationOutcome::Written(2)));
        assert_eq!(summary.to_string(), "2 locations: 1 written (2 rows), 0 empty, 1 failed");
    }

    #[tokio::test]
    async fn test_replace_mode_run_twice() {
        let fetcher = Arc::new(FakeFetcher::default().with("Pune,IN", two_days()));
        let store = sqlite().await;
        let mut run_settings = settings(&["Pune,IN"]);
        run_settings.mode = WriteMode::Replace;
        let pipeline = Pipeline::new(IngestContext::new(fetcher, store.clone(), run_settings));

        pipeline.run().await;
        pipeline.run().await;

        let pune = Location::parse("Pune,IN").unwrap();
        assert_eq!(store.count_rows(&pune).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_json_payload_is_cached() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cache = ResponseCache::new(tmp.path());
        let fetcher = Arc::new(FakeFetcher::default().with("Pune,IN", two_days()));
        let ctx = IngestContext::new(fetcher, sqlite().await, settings(&["Pune,IN"]))
            .with_cache(cache.clone());

        let pipeline = Pipeline::new(ctx);
        pipeline.run().await;

        let location = Location::parse("Pune,IN").unwrap();
        let path = cache.path_for(&location, &pipeline.context().settings.range);
        assert_eq!(std::fs::read_to_string(path).unwrap(), two_days().body);
    }

    #[tokio::test]
    async fn test_undecodable_payload_is_not_cached() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cache = ResponseCache::new(tmp.path().join("cache"));
        let fetcher = Arc::new(
            FakeFetcher::default().with("Pune,IN", RawPayload::json("<html>rate limited</html>")),
        );
        let ctx = IngestContext::new(fetcher, sqlite().await, settings(&["Pune,IN"]))
            .with_cache(cache.clone());

        let pipeline = Pipeline::new(ctx);
        let summary = pipeline.run().await;

        assert!(matches!(summary.outcome_for("Pune,IN"), Some(LocationOutcome::FetchFailed(_))));
        let location = Location::parse("Pune,IN").unwrap();
        assert!(!cache.path_for(&location, &pipeline.context().settings.range).exists());
        assert!(!tmp.path().join("cache").exists());
    }

    #[tokio::test]
    async fn test_delay_only_between_locations() {
        let fetcher = Arc::new(
            FakeFetcher::default()
                .with("Delhi,IN", two_days())
                .with("Pune,IN", two_days()),
        );
        let mut run_settings = settings(&["Delhi,IN", "Pune,IN"]);
        run_settings.delay = Duration::from_millis(200);
        let pipeline = Pipeline::new(IngestContext::new(fetcher, sqlite().await, run_settings));

        let started = std::time::Instant::now();
        pipeline.run().await;
        let elapsed = started.elapsed();

        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_millis(400), "slept after the last location");
    }
}
