//! JSON5 config file loading over schema defaults.

use crate::{BloomwatchConfig, ConfigError};
use log::{debug, info};
use std::fs;
use std::path::Path;

/// Load config from a JSON5 file, validating the result.
pub fn load(path: impl AsRef<Path>) -> Result<BloomwatchConfig, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let config: BloomwatchConfig = json5::from_str(&text)?;
    validate(&config)?;
    info!("loaded config (path={})", path.display());
    Ok(config)
}

/// Load config from a file if it exists, otherwise fall back to defaults.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<BloomwatchConfig, ConfigError> {
    let path = path.as_ref();
    if path.exists() {
        load(path)
    } else {
        debug!("config file missing, using defaults (path={})", path.display());
        Ok(BloomwatchConfig::default())
    }
}

/// Validate field constraints the schema cannot express.
fn validate(config: &BloomwatchConfig) -> Result<(), ConfigError> {
    if config.predictor.base_url.trim().is_empty() {
        return Err(ConfigError::InvalidField {
            path: "predictor.base_url".to_string(),
            message: "base URL cannot be empty".to_string(),
        });
    }
    if config.predictor.timeout_secs == 0 {
        return Err(ConfigError::InvalidField {
            path: "predictor.timeout_secs".to_string(),
            message: "timeout must be at least one second".to_string(),
        });
    }
    if !(-90.0..=90.0).contains(&config.map.center_lat) {
        return Err(ConfigError::InvalidField {
            path: "map.center_lat".to_string(),
            message: "latitude must be within [-90, 90]".to_string(),
        });
    }
    if !(-180.0..=180.0).contains(&config.map.center_lon) {
        return Err(ConfigError::InvalidField {
            path: "map.center_lon".to_string(),
            message: "longitude must be within [-180, 180]".to_string(),
        });
    }
    Ok(())
}
