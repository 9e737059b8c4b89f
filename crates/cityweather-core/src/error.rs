//! Error types shared by every cityweather crate.
//!
//! Everything in here is a *setup* error: a problem with the credentials
//! file, the location list or the requested date range. These are fatal and
//! are reported before any request reaches the upstream API.

use thiserror::Error;

/// Credentials / configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Failed to read configuration file {path}: {message}")]
    Unreadable { path: String, message: String },

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Missing required setting: {0}")]
    MissingSetting(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Short actionable hint printed next to the error on the console.
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::NotFound(_) => {
                "Create the credentials file or point --config at an existing one."
            }
            ConfigError::Unreadable { .. } => "Check the permissions of the credentials file.",
            ConfigError::ParseError(_) => "The credentials file is not valid JSON.",
            ConfigError::MissingSetting(_) => {
                "Add the missing key to the credentials file (api_key and a mysql or sqlite block)."
            }
            ConfigError::Invalid(_) => "Fix the reported settings in the credentials file.",
        }
    }
}

/// Invalid entries in the location list.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocationError {
    #[error("Location name is empty")]
    Empty,

    #[error("Location '{0}' has no usable characters for an identifier")]
    Unsluggable(String),

    #[error("Locations '{first}' and '{second}' map to the same slug '{slug}'")]
    DuplicateSlug { first: String, second: String, slug: String },
}

/// Invalid date range requests.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateRangeError {
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Start date {start} is after end date {end}")]
    Inverted { start: String, end: String },
}
