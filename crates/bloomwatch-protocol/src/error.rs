//! Error taxonomy shared across the client crates.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure category attached to a record or surfaced to the user.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum ErrorKind {
    /// A field failed validation before submission.
    #[error("validation failed: {0}")]
    Validation(String),
    /// The remote call failed at the network or HTTP layer.
    #[error("transport error: {0}")]
    Transport(String),
    /// The batch response length did not match the request length.
    #[error("response misaligned: expected {expected} entries, got {actual}")]
    Alignment {
        /// Number of records submitted.
        expected: usize,
        /// Number of entries received.
        actual: usize,
    },
}

/// Error body the service returns alongside non-2xx statuses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ErrorBody {
    /// Human-readable failure message, when the server provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Message to surface for a failed call, with the original client's
    /// generic fallback text.
    pub fn display_message(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| "Failed to get prediction.".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn error_kind_round_trips_through_json() {
        let kind = ErrorKind::Alignment {
            expected: 3,
            actual: 2,
        };
        let encoded = serde_json::to_value(&kind).expect("serialize");
        let decoded: ErrorKind = serde_json::from_value(encoded).expect("deserialize");
        assert_eq!(decoded, kind);
    }

    #[test]
    fn error_body_falls_back_to_generic_message() {
        let body: ErrorBody = serde_json::from_value(json!({})).expect("decode");
        assert_eq!(body.display_message(), "Failed to get prediction.".to_string());

        let body: ErrorBody =
            serde_json::from_value(json!({ "message": "no imagery" })).expect("decode");
        assert_eq!(body.display_message(), "no imagery".to_string());
    }
}
