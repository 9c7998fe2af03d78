//! Wire protocol types for the remote chlorophyll-a prediction service.

mod error;

pub use error::{ErrorBody, ErrorKind};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Imagery source key the service reports resolved dates under.
pub const SENTINEL2: &str = "Sentinel-2";
/// Display fallback when the service omits a resolved date.
pub const CLOSEST_AVAILABLE: &str = "Closest Available";

/// Body of a single-record `POST /predict` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictRequest {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
    /// Requested imagery date (`YYYY-MM-DD`).
    pub date: String,
}

/// One coordinate entry in a batched request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinate {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
}

/// Body of a batched `POST /predict-multi` request.
///
/// The service historically accepted the coordinate list under either
/// `coordinates` or `locations`; we always produce `coordinates` and accept
/// both on decode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictMultiRequest {
    /// Ordered coordinate list, aligned 1:1 with the expected response.
    #[serde(alias = "locations")]
    pub coordinates: Vec<Coordinate>,
    /// Requested imagery date shared by the batch, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Per-record prediction payload returned by the service.
///
/// Field naming drifted across service revisions (`Chlorophyll-a`,
/// `chlor_a`, `chl_a`); the canonical name is produced on encode and all
/// three are accepted on decode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PredictionPayload {
    /// Predicted chlorophyll-a concentration (µg/L), absent when the model
    /// could not produce a value for the point.
    #[serde(
        rename = "Chlorophyll-a",
        alias = "chlor_a",
        alias = "chl_a",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub chlorophyll_a: Option<f64>,
    /// Resolved imagery dates keyed by source.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dates: BTreeMap<String, String>,
}

impl PredictionPayload {
    /// Resolved Sentinel-2 imagery date, falling back to the display label
    /// the original client used when the service omitted one.
    pub fn resolved_date(&self) -> String {
        self.dates
            .get(SENTINEL2)
            .cloned()
            .unwrap_or_else(|| CLOSEST_AVAILABLE.to_string())
    }
}

/// Response shapes observed for `POST /predict-multi`.
///
/// The canonical contract is a bare ordered array; older service revisions
/// wrapped it in a `predictions` object.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PredictMultiResponse {
    /// Bare ordered array of per-record payloads.
    Bare(Vec<PredictionPayload>),
    /// Array wrapped in a `predictions` object.
    Wrapped {
        /// Ordered per-record payloads.
        predictions: Vec<PredictionPayload>,
    },
}

impl PredictMultiResponse {
    /// Unwrap into the ordered payload list.
    pub fn into_payloads(self) -> Vec<PredictionPayload> {
        match self {
            PredictMultiResponse::Bare(payloads) => payloads,
            PredictMultiResponse::Wrapped { predictions } => predictions,
        }
    }
}

/// Response shapes observed for `POST /upload`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum UploadResponse {
    /// Per-row result objects, kept opaque for display.
    Rows(Vec<Value>),
    /// Server-side file the client may download instead.
    Download {
        /// URL of the prepared results file.
        #[serde(rename = "downloadUrl")]
        download_url: String,
    },
}
