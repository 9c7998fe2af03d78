//! Batch submission: validation gate, remote call, positional merge.

use crate::error::{PredictorError, SubmitError};
use crate::predictor::Predictor;
use crate::store::SharedStore;
use crate::types::{
    PredictionResult, Record, Snapshot, latitude_in_range, longitude_in_range,
};
use bloomwatch_protocol::{Coordinate, ErrorKind, PredictMultiRequest, PredictRequest, PredictionPayload};
use chrono::NaiveDate;
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;

/// Per-submission lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubmitState {
    Idle,
    Validating,
    InFlight,
}

/// What a completed merge did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeReport {
    /// Results attached to live records.
    pub attached: usize,
    /// Outcomes discarded because their record was removed mid-flight.
    pub discarded: usize,
}

/// Turns a validated snapshot into remote requests and merges the ordered
/// response back by position.
///
/// Only one submission may be in flight at a time; a second attempt is
/// refused with [`SubmitError::Busy`], never queued.
pub struct BatchSubmitter {
    predictor: Arc<dyn Predictor>,
    state: Mutex<SubmitState>,
}

impl BatchSubmitter {
    /// Create a submitter over a predictor.
    pub fn new(predictor: Arc<dyn Predictor>) -> Self {
        Self {
            predictor,
            state: Mutex::new(SubmitState::Idle),
        }
    }

    /// Whether a submission is currently unresolved.
    pub fn is_in_flight(&self) -> bool {
        *self.state.lock() != SubmitState::Idle
    }

    /// Validate the current store contents, submit them, and merge the
    /// response. The snapshot used for the merge is captured here, before
    /// any interleaved edits; edits made while the request is in flight
    /// affect only the live store and are reconciled per id at merge time.
    pub async fn submit(&self, store: &SharedStore) -> Result<MergeReport, SubmitError> {
        {
            let mut state = self.state.lock();
            if *state != SubmitState::Idle {
                return Err(SubmitError::Busy);
            }
            *state = SubmitState::Validating;
        }

        let snapshot = store.lock().snapshot();
        let requests = match prepare_requests(&snapshot) {
            Ok(requests) => requests,
            Err(indices) => {
                *self.state.lock() = SubmitState::Idle;
                return Err(SubmitError::Validation { indices });
            }
        };

        *self.state.lock() = SubmitState::InFlight;
        info!("submission in flight (records={})", requests.len());
        let outcome = self.request(&requests).await;
        let result = match outcome {
            Ok(payloads) if payloads.len() != snapshot.len() => {
                // Positional alignment cannot be trusted; merge nothing.
                warn!(
                    "batch response misaligned (expected={}, actual={})",
                    snapshot.len(),
                    payloads.len()
                );
                Err(SubmitError::Alignment {
                    expected: snapshot.len(),
                    actual: payloads.len(),
                })
            }
            Ok(payloads) => Ok(merge(store, &snapshot, payloads)),
            Err(PredictorError::Transport(message)) => {
                mark_all_failed(store, &snapshot, &message);
                Err(SubmitError::Transport(message))
            }
        };
        *self.state.lock() = SubmitState::Idle;
        result
    }

    /// Issue one batched request, or fan out per-record calls in order when
    /// the service does not support batching or the rows disagree on date.
    async fn request(
        &self,
        requests: &[PredictRequest],
    ) -> Result<Vec<PredictionPayload>, PredictorError> {
        if let Some(date) = shared_date(requests).filter(|_| self.predictor.supports_batch()) {
            let request = PredictMultiRequest {
                coordinates: requests
                    .iter()
                    .map(|request| Coordinate {
                        lat: request.lat,
                        lon: request.lon,
                    })
                    .collect(),
                date: Some(date),
            };
            return self.predictor.predict_batch(&request).await;
        }

        let mut payloads = Vec::with_capacity(requests.len());
        for request in requests {
            payloads.push(self.predictor.predict(request).await?);
        }
        Ok(payloads)
    }
}

/// Indices of records that fail the submission gate, in snapshot order.
///
/// Every record needs an in-range latitude and longitude and a well-formed
/// `YYYY-MM-DD` date; submission never proceeds on any violation.
pub fn validate_snapshot(snapshot: &Snapshot) -> Vec<usize> {
    snapshot
        .records()
        .iter()
        .enumerate()
        .filter(|(_, record)| validated_request(record).is_none())
        .map(|(index, _)| index)
        .collect()
}

/// Build the outbound requests, or report every violating index.
fn prepare_requests(snapshot: &Snapshot) -> Result<Vec<PredictRequest>, Vec<usize>> {
    let mut requests = Vec::with_capacity(snapshot.len());
    let mut violations = Vec::new();
    for (index, record) in snapshot.records().iter().enumerate() {
        match validated_request(record) {
            Some(request) => requests.push(request),
            None => violations.push(index),
        }
    }
    // An empty batch is refused at the gate too; there is nothing to send.
    if violations.is_empty() && !snapshot.is_empty() {
        Ok(requests)
    } else {
        Err(violations)
    }
}

/// One record's request, if it passes the gate.
fn validated_request(record: &Record) -> Option<PredictRequest> {
    let lat = record.latitude_value().filter(|value| latitude_in_range(*value))?;
    let lon = record
        .longitude_value()
        .filter(|value| longitude_in_range(*value))?;
    let date = record.date.trim();
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    Some(PredictRequest {
        lat,
        lon,
        date: date.to_string(),
    })
}

/// The single date shared by the whole batch, if the rows agree.
fn shared_date(requests: &[PredictRequest]) -> Option<String> {
    let first = requests.first()?;
    requests
        .iter()
        .all(|request| request.date == first.date)
        .then(|| first.date.clone())
}

/// Attach each response entry to the record at its snapshot position.
/// Ids that have since been removed are discarded silently.
fn merge(
    store: &SharedStore,
    snapshot: &Snapshot,
    payloads: Vec<PredictionPayload>,
) -> MergeReport {
    let mut report = MergeReport {
        attached: 0,
        discarded: 0,
    };
    let mut store = store.lock();
    for (record, payload) in snapshot.records().iter().zip(payloads) {
        let result = PredictionResult::from_payload(record.id, &payload);
        match store.attach_result(record.id, result) {
            Ok(()) => report.attached += 1,
            Err(_) => {
                debug!("discarding result for removed record (id={})", record.id);
                report.discarded += 1;
            }
        }
    }
    info!(
        "merge complete (attached={}, discarded={})",
        report.attached, report.discarded
    );
    report
}

/// Mark every snapshot record still present with the same transport error.
fn mark_all_failed(store: &SharedStore, snapshot: &Snapshot, message: &str) {
    let mut store = store.lock();
    for record in snapshot.records() {
        let result =
            PredictionResult::failed(record.id, ErrorKind::Transport(message.to_string()));
        if store.attach_result(record.id, result).is_err() {
            debug!("discarding error for removed record (id={})", record.id);
        }
    }
}
