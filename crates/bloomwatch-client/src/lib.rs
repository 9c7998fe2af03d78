//! HTTP implementation of the predictor seam.

use async_trait::async_trait;
use bloomwatch_config::PredictorConfig;
use bloomwatch_core::{Predictor, PredictorError};
use bloomwatch_protocol::{
    ErrorBody, PredictMultiRequest, PredictMultiResponse, PredictRequest, PredictionPayload,
    UploadResponse,
};
use log::{debug, info};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Predictor backed by the remote HTTP service.
///
/// Every network failure, non-2xx status, and malformed body is mapped to
/// [`PredictorError::Transport`]; nothing else crosses the seam.
pub struct HttpPredictor {
    client: reqwest::Client,
    base_url: String,
    batch: bool,
}

impl HttpPredictor {
    /// Build a predictor from endpoint configuration.
    pub fn new(config: &PredictorConfig) -> Result<Self, PredictorError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| PredictorError::Transport(err.to_string()))?;
        info!(
            "http predictor ready (base_url={}, batch={})",
            config.base_url, config.batch
        );
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            batch: config.batch,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, PredictorError> {
        debug!("posting request (path={path})");
        let response = self
            .client
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await
            .map_err(|err| PredictorError::Transport(err.to_string()))?;
        decode(response).await
    }

    /// Upload CSV text as a multipart file and return the opaque outcome.
    pub async fn upload_csv(
        &self,
        file_name: &str,
        csv_text: String,
    ) -> Result<UploadResponse, PredictorError> {
        let part = reqwest::multipart::Part::text(csv_text)
            .file_name(file_name.to_string())
            .mime_str("text/csv")
            .map_err(|err| PredictorError::Transport(err.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);
        let response = self
            .client
            .post(self.endpoint("/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|err| PredictorError::Transport(err.to_string()))?;
        decode(response).await
    }
}

/// Turn a response into the expected body, mapping failures to transport
/// errors with the server-provided message when one exists.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, PredictorError> {
    let status = response.status();
    if !status.is_success() {
        let body: ErrorBody = response.json().await.unwrap_or_default();
        return Err(PredictorError::Transport(format!(
            "{status}: {}",
            body.display_message()
        )));
    }
    response
        .json::<T>()
        .await
        .map_err(|err| PredictorError::Transport(format!("malformed response body: {err}")))
}

#[async_trait]
impl Predictor for HttpPredictor {
    fn supports_batch(&self) -> bool {
        self.batch
    }

    async fn predict(
        &self,
        request: &PredictRequest,
    ) -> Result<PredictionPayload, PredictorError> {
        self.post_json("/predict", request).await
    }

    async fn predict_batch(
        &self,
        request: &PredictMultiRequest,
    ) -> Result<Vec<PredictionPayload>, PredictorError> {
        let response: PredictMultiResponse = self.post_json("/predict-multi", request).await?;
        Ok(response.into_payloads())
    }
}
