//! Core data types shared across the record workflow.

use bloomwatch_protocol::{ErrorKind, PredictionPayload};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a record.
pub type RecordId = Uuid;

/// Decimal digits used when formatting coordinates and predictions.
pub const COORD_PRECISION: usize = 6;

/// One user-entered coordinate+date query unit.
///
/// Fields are stored exactly as entered; they may be transiently empty or
/// unparseable while the user edits them, and are validated only at the
/// submission gate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    /// Stable identity, assigned at creation and never reused.
    pub id: RecordId,
    /// Latitude input text.
    pub latitude: String,
    /// Longitude input text.
    pub longitude: String,
    /// Requested imagery date input text (`YYYY-MM-DD`).
    pub date: String,
}

impl Record {
    /// Create a record with a freshly minted id.
    pub fn new(latitude: String, longitude: String, date: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            latitude,
            longitude,
            date,
        }
    }

    /// Create an empty record ready for editing.
    pub fn blank() -> Self {
        Self::new(String::new(), String::new(), String::new())
    }

    /// Latitude as a finite number, if the field currently parses.
    pub fn latitude_value(&self) -> Option<f64> {
        parse_finite(&self.latitude)
    }

    /// Longitude as a finite number, if the field currently parses.
    pub fn longitude_value(&self) -> Option<f64> {
        parse_finite(&self.longitude)
    }
}

/// Editable field of a record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    /// Latitude input.
    Latitude,
    /// Longitude input.
    Longitude,
    /// Date input.
    Date,
}

/// Row content without identity, used for CSV import and bulk replacement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordDraft {
    /// Latitude text.
    pub latitude: String,
    /// Longitude text.
    pub longitude: String,
    /// Date text.
    pub date: String,
}

impl RecordDraft {
    /// Create a draft row.
    pub fn new(
        latitude: impl Into<String>,
        longitude: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            latitude: latitude.into(),
            longitude: longitude.into(),
            date: date.into(),
        }
    }
}

/// Prediction outcome attached to a record after a submission resolves.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionResult {
    /// Back-reference to the record this result belongs to.
    pub record_id: RecordId,
    /// Predicted chlorophyll-a concentration (µg/L), absent on failure or
    /// when the model produced no value.
    pub chlorophyll_a: Option<f64>,
    /// Imagery date the service actually used ("closest available").
    pub resolved_date: String,
    /// Failure attached instead of a value, if the submission failed.
    pub error: Option<ErrorKind>,
}

impl PredictionResult {
    /// Build a successful result from a wire payload.
    pub fn from_payload(record_id: RecordId, payload: &PredictionPayload) -> Self {
        Self {
            record_id,
            chlorophyll_a: payload.chlorophyll_a,
            resolved_date: payload.resolved_date(),
            error: None,
        }
    }

    /// Build a failed result carrying the shared batch error.
    pub fn failed(record_id: RecordId, error: ErrorKind) -> Self {
        Self {
            record_id,
            chlorophyll_a: None,
            resolved_date: String::new(),
            error: Some(error),
        }
    }
}

/// A point reported by the mapping widget.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

/// Projection of one record onto the map, in store order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Marker {
    /// Record the marker is derived from.
    pub record_id: RecordId,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

/// Immutable ordered copy of the record sequence at a point in time.
///
/// Submissions capture a snapshot before going out and merge against it, so
/// later edits to the live store never disturb positional alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    records: Vec<Record>,
}

impl Snapshot {
    /// Wrap an ordered record copy.
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Records in store order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of records captured.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Whether a latitude lies within [-90, 90].
pub fn latitude_in_range(value: f64) -> bool {
    (-90.0..=90.0).contains(&value)
}

/// Whether a longitude lies within [-180, 180].
pub fn longitude_in_range(value: f64) -> bool {
    (-180.0..=180.0).contains(&value)
}

/// Parse a text field as a finite floating point number.
pub(crate) fn parse_finite(text: &str) -> Option<f64> {
    let value: f64 = text.trim().parse().ok()?;
    value.is_finite().then_some(value)
}

/// Format a coordinate at the fixed display precision.
pub fn format_coordinate(value: f64) -> String {
    format!("{value:.prec$}", prec = COORD_PRECISION)
}
