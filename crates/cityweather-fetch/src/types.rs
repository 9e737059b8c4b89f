use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Response encoding requested from the timeline API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentType {
    #[default]
    Json,
    Csv,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Json => "json",
            ContentType::Csv => "csv",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ContentType::Json),
            "csv" => Ok(ContentType::Csv),
            other => Err(format!("unknown content type '{other}', expected json or csv")),
        }
    }
}

/// One upstream day object, kept loosely typed.
///
/// Upstream omits fields freely, so lookups go through [`DayRecord::get`],
/// which treats a missing key and an explicit `null` the same way.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct DayRecord(Map<String, Value>);

impl DayRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Field value, or `None` when absent or `null`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for DayRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// The parts of a JSON timeline payload the pipeline reads.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelinePayload {
    #[serde(default)]
    pub resolved_address: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    /// `None` when the payload has no `days` key at all.
    #[serde(default)]
    pub days: Option<Vec<DayRecord>>,
}
