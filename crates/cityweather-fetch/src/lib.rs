//! Upstream side of the pipeline: the timeline HTTP client, payload
//! decoding, the raw response cache and day-record normalization.

pub mod cache;
pub mod client;
pub mod csv_days;
pub mod error;
pub mod normalize;
pub mod types;

pub use cache::ResponseCache;
pub use client::{DayFetcher, RawPayload, TimelineClient, DEFAULT_TIMEOUT};
pub use error::FetchError;
pub use normalize::{normalize_day, normalize_days};
pub use types::{ContentType, DayRecord, TimelinePayload};
