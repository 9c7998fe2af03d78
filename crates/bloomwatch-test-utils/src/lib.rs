//! Test doubles for the bloomwatch crates.

use async_trait::async_trait;
use bloomwatch_core::{Predictor, PredictorError};
use bloomwatch_protocol::{
    PredictMultiRequest, PredictRequest, PredictionPayload, SENTINEL2,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Notify;

/// Build a payload with a value and a resolved Sentinel-2 date.
pub fn payload(chlorophyll_a: f64, resolved_date: &str) -> PredictionPayload {
    let mut result = PredictionPayload {
        chlorophyll_a: Some(chlorophyll_a),
        ..PredictionPayload::default()
    };
    result
        .dates
        .insert(SENTINEL2.to_string(), resolved_date.to_string());
    result
}

/// Scripted predictor that replays queued responses and records requests.
///
/// An optional gate holds every call until released, so tests can mutate
/// the store while a submission is in flight.
#[derive(Default)]
pub struct ScriptedPredictor {
    supports_batch: bool,
    batches: Mutex<VecDeque<Result<Vec<PredictionPayload>, PredictorError>>>,
    singles: Mutex<VecDeque<Result<PredictionPayload, PredictorError>>>,
    batch_requests: Mutex<Vec<PredictMultiRequest>>,
    single_requests: Mutex<Vec<PredictRequest>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl ScriptedPredictor {
    /// Create a predictor that advertises batch support.
    pub fn new() -> Self {
        Self {
            supports_batch: true,
            ..Self::default()
        }
    }

    /// Create a predictor that only answers single-record calls.
    pub fn without_batch() -> Self {
        Self {
            supports_batch: false,
            ..Self::default()
        }
    }

    /// Queue a successful batch response.
    pub fn push_batch(&self, payloads: Vec<PredictionPayload>) {
        self.batches.lock().push_back(Ok(payloads));
    }

    /// Queue a failed batch response.
    pub fn push_batch_error(&self, message: &str) {
        self.batches
            .lock()
            .push_back(Err(PredictorError::Transport(message.to_string())));
    }

    /// Queue a successful single-record response.
    pub fn push_single(&self, payload: PredictionPayload) {
        self.singles.lock().push_back(Ok(payload));
    }

    /// Queue a failed single-record response.
    pub fn push_single_error(&self, message: &str) {
        self.singles
            .lock()
            .push_back(Err(PredictorError::Transport(message.to_string())));
    }

    /// Hold every subsequent call until the returned gate is notified.
    pub fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    /// Batch requests seen so far.
    pub fn batch_requests(&self) -> Vec<PredictMultiRequest> {
        self.batch_requests.lock().clone()
    }

    /// Single-record requests seen so far.
    pub fn single_requests(&self) -> Vec<PredictRequest> {
        self.single_requests.lock().clone()
    }

    async fn wait_gate(&self) {
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl Predictor for ScriptedPredictor {
    fn supports_batch(&self) -> bool {
        self.supports_batch
    }

    async fn predict(
        &self,
        request: &PredictRequest,
    ) -> Result<PredictionPayload, PredictorError> {
        self.single_requests.lock().push(request.clone());
        self.wait_gate().await;
        self.singles
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(PredictorError::Transport("no scripted response".to_string())))
    }

    async fn predict_batch(
        &self,
        request: &PredictMultiRequest,
    ) -> Result<Vec<PredictionPayload>, PredictorError> {
        self.batch_requests.lock().push(request.clone());
        self.wait_gate().await;
        self.batches
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(PredictorError::Transport("no scripted response".to_string())))
    }
}
