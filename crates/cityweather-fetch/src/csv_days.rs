//! Decoding of `contentType=csv` timeline payloads into day records.

use serde_json::Value;

use crate::error::FetchError;
use crate::types::DayRecord;

/// Columns upstream sends as comma-joined lists in CSV and as arrays in JSON.
const LIST_COLUMNS: &[&str] = &["preciptype", "stations"];

/// Trim, lower-case and replace spaces with `_`.
///
/// Upstream CSV headers look like `"Max Temp"` or `"Name"`; day records
/// use the JSON field spelling.
pub fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "_")
}

/// Parse a CSV body, one record per data row.
///
/// Cells stay text, except list columns which become arrays so both
/// encodings normalize to the same JSON text. Empty cells are left out.
pub fn decode_days(body: &str) -> Result<Vec<DayRecord>, FetchError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(normalize_header).collect();

    let mut days = Vec::new();
    for result in reader.records() {
        let record = result?;
        let mut day = DayRecord::default();
        for (header, cell) in headers.iter().zip(record.iter()) {
            if cell.is_empty() || header.is_empty() {
                continue;
            }
            day.insert(header.clone(), cell_value(header, cell));
        }
        days.push(day);
    }

    tracing::debug!(rows = days.len(), columns = headers.len(), "Decoded CSV payload");
    Ok(days)
}

fn cell_value(header: &str, cell: &str) -> Value {
    if LIST_COLUMNS.contains(&header) {
        Value::Array(
            cell.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| Value::String(item.to_string()))
                .collect(),
        )
    } else {
        Value::String(cell.to_string())
    }
}
