//! Locations and date ranges the pipeline is asked to ingest.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::fmt;

use crate::error::{DateRangeError, LocationError};

/// The ten metro cities ingested by default.
pub const METRO_CITIES: &[&str] = &[
    "Mumbai,IN",
    "Delhi,IN",
    "Pune,IN",
    "Chennai,IN",
    "Bengaluru,IN",
    "Ahmedabad,IN",
    "Kolkata,IN",
    "Hyderabad,IN",
    "Jaipur,IN",
    "Lucknow,IN",
];

/// Hill stations and tourist places used for history backfills.
pub const TOURIST_PLACES: &[&str] = &[
    "Manali,IN",
    "Shimla,IN",
    "Auli,IN",
    "Gulmarg,IN",
    "Leh,IN",
    "Udaipur,IN",
    "Mount Abu,IN",
    "Rishikesh,IN",
    "Nainital,IN",
    "Kutch,IN",
    "Ooty,IN",
    "Coorg,IN",
    "Munnar,IN",
    "Kodaikanal,IN",
    "Darjeeling,IN",
    "Mahabaleshwar,IN",
    "Gangtok,IN",
    "Shillong,IN",
    "Tawang,IN",
    "Kerala,IN",
    "Goa,IN",
    "Lonavala,IN",
    "Cherrapunji,IN",
    "Wayanad,IN",
    "Konkan,IN",
    "Mussoorie,IN",
    "Panchgani,IN",
];

/// A place identifier such as `"Pune,IN"`, with its identifier-safe slug.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    name: String,
    slug: String,
}

impl Location {
    /// Parse a `"City,CC"` (or bare `"City"`) location name.
    pub fn parse(raw: &str) -> Result<Self, LocationError> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(LocationError::Empty);
        }

        let slug = slugify(name);
        if slug.chars().all(|c| c == '_') {
            return Err(LocationError::Unsluggable(name.to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            slug,
        })
    }

    /// Name as sent upstream and stored in the `name` column.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lower-case ASCII identifier, e.g. `mount_abu_in`.
    pub fn slug(&self) -> &str {
        &self.slug
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Lower-cases and replaces every character that is not ASCII alphanumeric
/// with `_`.
pub fn slugify(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Ordered, validated set of locations for one run.
///
/// Built once; two names that collapse to the same slug are rejected so the
/// slug can be used as a stable key (cache files, log fields).
#[derive(Debug, Clone, Default)]
pub struct LocationRegistry {
    locations: Vec<Location>,
    by_slug: HashMap<String, usize>,
}

impl LocationRegistry {
    pub fn new<I, S>(names: I) -> Result<Self, LocationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Self::default();
        for name in names {
            registry.push(Location::parse(name.as_ref())?)?;
        }
        Ok(registry)
    }

    fn push(&mut self, location: Location) -> Result<(), LocationError> {
        if let Some(&existing) = self.by_slug.get(location.slug()) {
            return Err(LocationError::DuplicateSlug {
                first: self.locations[existing].name().to_string(),
                second: location.name().to_string(),
                slug: location.slug().to_string(),
            });
        }
        self.by_slug.insert(location.slug().to_string(), self.locations.len());
        self.locations.push(location);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.locations.iter()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

/// Parse a calendar date leniently: `2025-10-05`, `2025-10-5`, or an ISO
/// date-time whose date part is kept.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
}

/// Local date-time layouts whose date part [`parse_date`] keeps.
const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Inclusive `[start, end]` range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateRangeError> {
        if start > end {
            return Err(DateRangeError::Inverted {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Parse two `YYYY-MM-DD` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, DateRangeError> {
        let start_date =
            parse_date(start).ok_or_else(|| DateRangeError::InvalidDate(start.to_string()))?;
        let end_date = parse_date(end).ok_or_else(|| DateRangeError::InvalidDate(end.to_string()))?;
        Self::new(start_date, end_date)
    }

    /// Today's local date only.
    pub fn today() -> Self {
        let today = Local::now().date_naive();
        Self {
            start: today,
            end: today,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of calendar days covered, both ends included.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.start, self.end)
    }
}
