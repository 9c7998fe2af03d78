//! CSV round-trip codec: tolerant import, lossless export.

use crate::error::CsvError;
use crate::types::{
    PredictionResult, Record, RecordDraft, RecordId, format_coordinate, latitude_in_range,
    longitude_in_range, parse_finite,
};
use log::debug;
use std::collections::HashMap;

/// Column order produced on export.
const EXPORT_HEADER: [&str; 5] = [
    "latitude",
    "longitude",
    "date",
    "chlorophyll_a",
    "resolved_date",
];

/// Outcome of a tolerant CSV import.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CsvImport {
    /// Rows that passed the acceptance checks, in file order.
    pub accepted: Vec<RecordDraft>,
    /// Count of data rows that were dropped.
    pub rejected: usize,
}

/// Column positions declared by an import header.
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    latitude: usize,
    longitude: usize,
    date: usize,
}

impl ColumnMap {
    /// Resolve the three required columns from header names, in any
    /// permutation. Unrecognized columns are ignored.
    fn from_header(header: &csv::StringRecord) -> Option<Self> {
        let mut latitude = None;
        let mut longitude = None;
        let mut date = None;
        for (index, name) in header.iter().enumerate() {
            match name.trim().to_ascii_lowercase().as_str() {
                "lat" | "latitude" => latitude = latitude.or(Some(index)),
                "lon" | "lng" | "long" | "longitude" => longitude = longitude.or(Some(index)),
                "date" => date = date.or(Some(index)),
                _ => {}
            }
        }
        Some(Self {
            latitude: latitude?,
            longitude: longitude?,
            date: date?,
        })
    }
}

/// Parse uploaded CSV text into candidate rows.
///
/// The first line is the header; it declares where the latitude, longitude,
/// and date columns live. A data row is accepted only if both coordinates
/// parse as finite in-range numbers and the date is non-empty; everything
/// else increments the reject counter. Parsing never fails: fully malformed
/// input yields zero accepted rows and all data rows rejected.
pub fn parse(text: &str) -> CsvImport {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let columns = match reader.headers() {
        Ok(header) => ColumnMap::from_header(header),
        Err(_) => None,
    };

    let mut import = CsvImport::default();
    for row in reader.records() {
        let Ok(row) = row else {
            import.rejected += 1;
            continue;
        };
        let Some(columns) = columns else {
            import.rejected += 1;
            continue;
        };
        match accept_row(&row, columns) {
            Some(draft) => import.accepted.push(draft),
            None => import.rejected += 1,
        }
    }
    debug!(
        "csv import parsed (accepted={}, rejected={})",
        import.accepted.len(),
        import.rejected
    );
    import
}

/// Apply the acceptance checks to one data row.
fn accept_row(row: &csv::StringRecord, columns: ColumnMap) -> Option<RecordDraft> {
    let latitude = row.get(columns.latitude)?.trim();
    let longitude = row.get(columns.longitude)?.trim();
    let date = row.get(columns.date)?.trim();

    let lat = parse_finite(latitude)?;
    let lon = parse_finite(longitude)?;
    if !latitude_in_range(lat) || !longitude_in_range(lon) || date.is_empty() {
        return None;
    }
    Some(RecordDraft::new(latitude, longitude, date))
}

/// Serialize records and their results to CSV text.
///
/// One header line, then one line per record in store order: latitude,
/// longitude, date, and — when a result exists — the chlorophyll value and
/// resolved date. Coordinates that parse are written at fixed precision so
/// that re-importing reproduces them exactly; fields that do not parse are
/// written as-is.
pub fn serialize(
    rows: &[Record],
    results: &HashMap<RecordId, PredictionResult>,
) -> Result<String, CsvError> {
    let mut bytes = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut bytes);
        writer.write_record(EXPORT_HEADER)?;
        for record in rows {
            let result = results.get(&record.id);
            let chlorophyll = result
                .and_then(|result| result.chlorophyll_a)
                .map(format_coordinate)
                .unwrap_or_default();
            let resolved_date = result
                .map(|result| result.resolved_date.clone())
                .unwrap_or_default();
            writer.write_record([
                coordinate_text(&record.latitude),
                coordinate_text(&record.longitude),
                record.date.clone(),
                chlorophyll,
                resolved_date,
            ])?;
        }
        writer.flush()?;
    }
    Ok(String::from_utf8(bytes)?)
}

/// Fixed-precision text for a coordinate field, or the raw text when it
/// does not parse.
fn coordinate_text(field: &str) -> String {
    match parse_finite(field) {
        Some(value) => format_coordinate(value),
        None => field.to_string(),
    }
}
