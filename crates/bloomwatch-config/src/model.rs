//! Configuration schema for the bloomwatch client.

use serde::{Deserialize, Serialize};

/// Root config for the bloomwatch client.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BloomwatchConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub predictor: PredictorConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

/// Remote prediction service endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictorConfig {
    /// Base URL of the prediction service.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Whether the service supports `/predict-multi`; when false the client
    /// fans out one `/predict` call per record.
    #[serde(default = "default_batch")]
    pub batch: bool,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            batch: default_batch(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Map widget settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Latitude the map centers on when the store is empty.
    #[serde(default = "default_center_lat")]
    pub center_lat: f64,
    /// Longitude the map centers on when the store is empty.
    #[serde(default = "default_center_lon")]
    pub center_lon: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center_lat: default_center_lat(),
            center_lon: default_center_lon(),
        }
    }
}

/// CSV export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// File name offered for the downloaded results CSV.
    #[serde(default = "default_file_name")]
    pub file_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_name: default_file_name(),
        }
    }
}

fn default_base_url() -> String {
    "https://chlorophyll-api.onrender.com".to_string()
}

fn default_batch() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_center_lat() -> f64 {
    16.1
}

fn default_center_lon() -> f64 {
    81.5
}

fn default_file_name() -> String {
    "prediction_results.csv".to_string()
}
