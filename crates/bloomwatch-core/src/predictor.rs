//! Seam to the remote prediction service.

use crate::error::PredictorError;
use async_trait::async_trait;
use bloomwatch_protocol::{PredictMultiRequest, PredictRequest, PredictionPayload};

/// Remote predictor interface.
///
/// Implementations map every network, HTTP, or body-shape failure to
/// [`PredictorError::Transport`]; no other failure crosses this seam.
#[async_trait]
pub trait Predictor: Send + Sync {
    /// Whether the service supports batched prediction. When false the
    /// submitter fans out one single-record call per row instead.
    fn supports_batch(&self) -> bool {
        true
    }

    /// Predict for a single record.
    async fn predict(&self, request: &PredictRequest)
    -> Result<PredictionPayload, PredictorError>;

    /// Predict for an ordered batch; the response is expected to align
    /// 1:1 with the request order.
    async fn predict_batch(
        &self,
        request: &PredictMultiRequest,
    ) -> Result<Vec<PredictionPayload>, PredictorError>;
}
