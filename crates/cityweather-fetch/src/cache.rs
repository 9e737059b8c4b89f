//! Write-only disk cache of raw timeline payloads.

use sha2::{Digest, Sha256};
use std::path::PathBuf;

use cityweather_core::{DateRange, Location};

/// Directory of raw JSON responses, one file per (location, start, end).
///
/// Nothing reads the files back; they are kept for offline inspection.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
}

impl ResponseCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File name for a request: sha256 hex of `"location|start|end"` plus `.json`.
    pub fn file_name(location: &Location, range: &DateRange) -> String {
        let key = format!("{}|{}|{}", location.name(), range.start(), range.end());
        let digest = Sha256::digest(key.as_bytes());
        format!("{}.json", hex::encode(digest))
    }

    pub fn path_for(&self, location: &Location, range: &DateRange) -> PathBuf {
        self.dir.join(Self::file_name(location, range))
    }

    /// Store a raw body, creating the directory on demand.
    ///
    /// Failures are logged and swallowed.
    pub async fn write(&self, location: &Location, range: &DateRange, body: &str) {
        let path = self.path_for(location, range);

        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            tracing::debug!(dir = %self.dir.display(), "Failed to create cache dir: {}", e);
            return;
        }

        match tokio::fs::write(&path, body).await {
            Ok(()) => tracing::debug!(path = %path.display(), location = %location, "Cached response"),
            Err(e) => tracing::debug!(path = %path.display(), "Failed to write cache file: {}", e),
        }
    }
}
