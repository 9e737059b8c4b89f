//! Mapping of loosely-typed day records onto [`WeatherRow`].

use serde_json::Value;

use cityweather_core::location::parse_date;
use cityweather_core::observation::{is_text_column, MEASUREMENT_COLUMNS, SOURCE_VISUAL_CROSSING};
use cityweather_core::{Location, ObservationDate, OwnedFieldValue, WeatherRow};

use crate::types::DayRecord;

/// Normalize one day record for `location`.
///
/// Returns `None` only when the record has no `datetime`; every other
/// missing or malformed field becomes a null column.
pub fn normalize_day(location: &Location, day: &DayRecord) -> Option<WeatherRow> {
    let datetime = match day.get("datetime")? {
        Value::String(raw) => match parse_date(raw) {
            Some(date) => ObservationDate::Parsed(date),
            None => ObservationDate::Raw(raw.clone()),
        },
        other => ObservationDate::Raw(other.to_string()),
    };

    let mut row = WeatherRow {
        name: location.name().to_string(),
        datetime,
        source: SOURCE_VISUAL_CROSSING.to_string(),
        ..Default::default()
    };

    for column in MEASUREMENT_COLUMNS {
        let value = day.get(column);
        let owned = if is_text_column(column) {
            OwnedFieldValue::Text(value.and_then(as_text))
        } else {
            OwnedFieldValue::Number(value.and_then(as_number))
        };
        row.set_measurement(column, owned);
    }

    Some(row)
}

/// Normalize a whole payload, dropping records without a date.
pub fn normalize_days(location: &Location, days: &[DayRecord]) -> Vec<WeatherRow> {
    let rows: Vec<WeatherRow> = days.iter().filter_map(|day| normalize_day(location, day)).collect();

    let dropped = days.len() - rows.len();
    if dropped > 0 {
        tracing::warn!(location = %location, dropped, "Skipped day records without datetime");
    }
    rows
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let parsed = s.trim().parse::<f64>().ok().filter(|n| n.is_finite());
            if parsed.is_none() {
                tracing::debug!(value = %s, "Non-numeric text in numeric column");
            }
            parsed
        }
        _ => None,
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(_) | Value::Object(_) => serde_json::to_string(value).ok(),
        Value::Null => None,
    }
}
