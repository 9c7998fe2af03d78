//! Configuration schema and file loading for the bloomwatch client.

mod error;
mod loader;
mod model;

/// Public error type returned by config loading APIs.
pub use error::ConfigError;
/// File loading entry points.
pub use loader::{load, load_or_default};
/// Configuration schema models.
pub use model::*;
