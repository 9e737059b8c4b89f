//! Visual Crossing timeline client.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::instrument;
use url::Url;

use cityweather_core::{DateRange, Location};

use crate::csv_days;
use crate::error::FetchError;
use crate::types::{ContentType, DayRecord, TimelinePayload};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(40);

/// Undecoded response body plus the encoding it was requested in.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPayload {
    pub content_type: ContentType,
    pub body: String,
}

impl RawPayload {
    pub fn json(body: impl Into<String>) -> Self {
        Self {
            content_type: ContentType::Json,
            body: body.into(),
        }
    }

    pub fn csv(body: impl Into<String>) -> Self {
        Self {
            content_type: ContentType::Csv,
            body: body.into(),
        }
    }

    /// Decode into day records. A JSON payload without `days` yields none.
    pub fn decode(&self) -> Result<Vec<DayRecord>, FetchError> {
        match self.content_type {
            ContentType::Json => {
                let payload: TimelinePayload = serde_json::from_str(&self.body)?;
                tracing::debug!(
                    resolved_address = payload.resolved_address.as_deref().unwrap_or("-"),
                    timezone = payload.timezone.as_deref().unwrap_or("-"),
                    "Decoded JSON payload"
                );
                Ok(payload.days.unwrap_or_default())
            }
            ContentType::Csv => csv_days::decode_days(&self.body),
        }
    }
}

/// Source of raw day payloads for one location and date range.
#[async_trait]
pub trait DayFetcher: Send + Sync {
    async fn fetch(
        &self,
        location: &Location,
        range: &DateRange,
        content_type: ContentType,
    ) -> Result<RawPayload, FetchError>;
}

/// HTTP client for the timeline endpoint. One `GET` per call, no retries.
#[derive(Debug, Clone)]
pub struct TimelineClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl TimelineClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, FetchError> {
        let base_url =
            Url::parse(base_url).map_err(|e| FetchError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::InvalidUrl(base_url.to_string()));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
        })
    }

    /// `<base>/<location>/<start>/<end>?unitGroup=metric&key=..&include=days&contentType=..`
    pub fn request_url(
        &self,
        location: &Location,
        range: &DateRange,
        content_type: ContentType,
    ) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| FetchError::InvalidUrl(self.base_url.to_string()))?;
            segments
                .pop_if_empty()
                .push(location.name())
                .push(&range.start().to_string())
                .push(&range.end().to_string());
        }
        url.query_pairs_mut()
            .append_pair("unitGroup", "metric")
            .append_pair("key", &self.api_key)
            .append_pair("include", "days")
            .append_pair("contentType", content_type.as_str());
        Ok(url)
    }
}

#[async_trait]
impl DayFetcher for TimelineClient {
    #[instrument(skip(self, location, range), fields(location = %location, range = %range), level = "info")]
    async fn fetch(
        &self,
        location: &Location,
        range: &DateRange,
        content_type: ContentType,
    ) -> Result<RawPayload, FetchError> {
        let url = self.request_url(location, range, content_type)?;

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), "Timeline request rejected");
            return Err(FetchError::status(status.as_u16(), &text));
        }

        let body = response.text().await?;
        tracing::debug!(bytes = body.len(), "Timeline response received");

        Ok(RawPayload { content_type, body })
    }
}
