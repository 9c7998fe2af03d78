//! Error types for the core record workflow.

use crate::types::RecordId;
use thiserror::Error;

/// Errors returned by record store mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The record id is not present in the store.
    #[error("record not found: {0}")]
    NotFound(RecordId),
}

/// Errors returned by a submission attempt.
#[derive(Debug, Error, PartialEq)]
pub enum SubmitError {
    /// Another submission is already in flight; the attempt was refused,
    /// not queued.
    #[error("a submission is already in flight")]
    Busy,
    /// One or more records failed the pre-submission gate.
    #[error("validation failed for {} record(s)", indices.len())]
    Validation {
        /// Indices of the violating records, in snapshot order.
        indices: Vec<usize>,
    },
    /// The remote call failed at the network or HTTP layer.
    #[error("transport error: {0}")]
    Transport(String),
    /// The batch response length did not match the request length; nothing
    /// was merged because positional alignment cannot be trusted.
    #[error("batch response misaligned: expected {expected}, got {actual}")]
    Alignment {
        /// Number of records submitted.
        expected: usize,
        /// Number of response entries received.
        actual: usize,
    },
}

/// Errors returned by the remote predictor seam.
#[derive(Debug, Error)]
pub enum PredictorError {
    /// Network failure, non-2xx status, or malformed response body.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Errors returned while writing CSV output.
///
/// Parsing never errors; malformed rows are counted as rejects instead.
#[derive(Debug, Error)]
pub enum CsvError {
    /// The CSV writer failed.
    #[error("csv write error: {0}")]
    Write(#[from] csv::Error),
    /// Flushing the CSV writer failed.
    #[error("csv io error: {0}")]
    Io(#[from] std::io::Error),
    /// Writer output was not valid UTF-8.
    #[error("csv output was not utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
