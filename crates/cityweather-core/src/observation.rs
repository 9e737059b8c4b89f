//! The flat row persisted for one (location, date) observation.

use chrono::NaiveDate;
use std::fmt;

/// Provenance literal stored in the `source` column.
pub const SOURCE_VISUAL_CROSSING: &str = "visualcrossing";

/// Measurement columns, in table order. Everything between `datetime` and
/// `source`; these are the columns an upsert overwrites.
pub const MEASUREMENT_COLUMNS: [&str; 31] = [
    "temp",
    "tempmax",
    "tempmin",
    "feelslike",
    "feelslikemax",
    "feelslikemin",
    "dew",
    "humidity",
    "precip",
    "precipprob",
    "precipcover",
    "preciptype",
    "sealevelpressure",
    "severerisk",
    "snow",
    "snowdepth",
    "cloudcover",
    "conditions",
    "description",
    "icon",
    "stations",
    "solarradiation",
    "solarenergy",
    "uvindex",
    "visibility",
    "winddir",
    "windgust",
    "windspeed",
    "sunrise",
    "sunset",
    "moonphase",
];

/// Calendar date of an observation.
///
/// Upstream dates that do not parse are kept verbatim rather than dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservationDate {
    Parsed(NaiveDate),
    Raw(String),
}

impl ObservationDate {
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            ObservationDate::Parsed(date) => Some(*date),
            ObservationDate::Raw(_) => None,
        }
    }
}

impl fmt::Display for ObservationDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObservationDate::Parsed(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            ObservationDate::Raw(raw) => f.write_str(raw),
        }
    }
}

/// Borrowed value of one measurement column, used by the stores to bind
/// parameters in column order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Number(Option<f64>),
    Text(Option<&'a str>),
}

/// One normalized daily observation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherRow {
    pub name: String,
    pub datetime: ObservationDate,
    pub temp: Option<f64>,
    pub tempmax: Option<f64>,
    pub tempmin: Option<f64>,
    pub feelslike: Option<f64>,
    pub feelslikemax: Option<f64>,
    pub feelslikemin: Option<f64>,
    pub dew: Option<f64>,
    pub humidity: Option<f64>,
    pub precip: Option<f64>,
    pub precipprob: Option<f64>,
    pub precipcover: Option<f64>,
    /// JSON text when upstream sent a list, e.g. `["rain","snow"]`.
    pub preciptype: Option<String>,
    pub sealevelpressure: Option<f64>,
    pub severerisk: Option<f64>,
    pub snow: Option<f64>,
    pub snowdepth: Option<f64>,
    pub cloudcover: Option<f64>,
    pub conditions: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    /// JSON text when upstream sent a list of station ids.
    pub stations: Option<String>,
    pub solarradiation: Option<f64>,
    pub solarenergy: Option<f64>,
    pub uvindex: Option<f64>,
    pub visibility: Option<f64>,
    pub winddir: Option<f64>,
    pub windgust: Option<f64>,
    pub windspeed: Option<f64>,
    pub sunrise: Option<String>,
    pub sunset: Option<String>,
    pub moonphase: Option<f64>,
    pub source: String,
}

impl Default for ObservationDate {
    fn default() -> Self {
        ObservationDate::Raw(String::new())
    }
}

impl WeatherRow {
    /// Measurement values in `MEASUREMENT_COLUMNS` order.
    pub fn measurements(&self) -> [FieldValue<'_>; 31] {
        use FieldValue::{Number, Text};

        [
            Number(self.temp),
            Number(self.tempmax),
            Number(self.tempmin),
            Number(self.feelslike),
            Number(self.feelslikemax),
            Number(self.feelslikemin),
            Number(self.dew),
            Number(self.humidity),
            Number(self.precip),
            Number(self.precipprob),
            Number(self.precipcover),
            Text(self.preciptype.as_deref()),
            Number(self.sealevelpressure),
            Number(self.severerisk),
            Number(self.snow),
            Number(self.snowdepth),
            Number(self.cloudcover),
            Text(self.conditions.as_deref()),
            Text(self.description.as_deref()),
            Text(self.icon.as_deref()),
            Text(self.stations.as_deref()),
            Number(self.solarradiation),
            Number(self.solarenergy),
            Number(self.uvindex),
            Number(self.visibility),
            Number(self.winddir),
            Number(self.windgust),
            Number(self.windspeed),
            Text(self.sunrise.as_deref()),
            Text(self.sunset.as_deref()),
            Number(self.moonphase),
        ]
    }

    /// Set a measurement column by name. Used when reading rows back from a
    /// store; unknown columns and mismatched kinds are ignored.
    pub fn set_measurement(&mut self, column: &str, value: OwnedFieldValue) {
        match (column, value) {
            ("temp", OwnedFieldValue::Number(v)) => self.temp = v,
            ("tempmax", OwnedFieldValue::Number(v)) => self.tempmax = v,
            ("tempmin", OwnedFieldValue::Number(v)) => self.tempmin = v,
            ("feelslike", OwnedFieldValue::Number(v)) => self.feelslike = v,
            ("feelslikemax", OwnedFieldValue::Number(v)) => self.feelslikemax = v,
            ("feelslikemin", OwnedFieldValue::Number(v)) => self.feelslikemin = v,
            ("dew", OwnedFieldValue::Number(v)) => self.dew = v,
            ("humidity", OwnedFieldValue::Number(v)) => self.humidity = v,
            ("precip", OwnedFieldValue::Number(v)) => self.precip = v,
            ("precipprob", OwnedFieldValue::Number(v)) => self.precipprob = v,
            ("precipcover", OwnedFieldValue::Number(v)) => self.precipcover = v,
            ("preciptype", OwnedFieldValue::Text(v)) => self.preciptype = v,
            ("sealevelpressure", OwnedFieldValue::Number(v)) => self.sealevelpressure = v,
            ("severerisk", OwnedFieldValue::Number(v)) => self.severerisk = v,
            ("snow", OwnedFieldValue::Number(v)) => self.snow = v,
            ("snowdepth", OwnedFieldValue::Number(v)) => self.snowdepth = v,
            ("cloudcover", OwnedFieldValue::Number(v)) => self.cloudcover = v,
            ("conditions", OwnedFieldValue::Text(v)) => self.conditions = v,
            ("description", OwnedFieldValue::Text(v)) => self.description = v,
            ("icon", OwnedFieldValue::Text(v)) => self.icon = v,
            ("stations", OwnedFieldValue::Text(v)) => self.stations = v,
            ("solarradiation", OwnedFieldValue::Number(v)) => self.solarradiation = v,
            ("solarenergy", OwnedFieldValue::Number(v)) => self.solarenergy = v,
            ("uvindex", OwnedFieldValue::Number(v)) => self.uvindex = v,
            ("visibility", OwnedFieldValue::Number(v)) => self.visibility = v,
            ("winddir", OwnedFieldValue::Number(v)) => self.winddir = v,
            ("windgust", OwnedFieldValue::Number(v)) => self.windgust = v,
            ("windspeed", OwnedFieldValue::Number(v)) => self.windspeed = v,
            ("sunrise", OwnedFieldValue::Text(v)) => self.sunrise = v,
            ("sunset", OwnedFieldValue::Text(v)) => self.sunset = v,
            ("moonphase", OwnedFieldValue::Number(v)) => self.moonphase = v,
            (other, _) => tracing::debug!(column = other, "Ignoring unexpected column value"),
        }
    }
}

/// Owned counterpart of [`FieldValue`], produced when reading rows back.
#[derive(Debug, Clone, PartialEq)]
pub enum OwnedFieldValue {
    Number(Option<f64>),
    Text(Option<String>),
}

/// Whether a measurement column holds text (otherwise it is numeric).
pub fn is_text_column(column: &str) -> bool {
    matches!(
        column,
        "preciptype" | "conditions" | "description" | "icon" | "stations" | "sunrise" | "sunset"
    )
}
