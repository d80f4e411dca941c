use common::{
    BatchPredictRequest, ErrorBody, FeatureVector, PredictionResponse, ServiceInfo, Species,
    BATCH_PREDICT_PATH, PREDICT_PATH,
};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Failure classes shown to the user. "Could not reach the service",
/// "the service rejected the request" and "the service failed" are kept
/// apart so the message points at the right party.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("could not reach the prediction service at {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("the service rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("the service returned an error status ({status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("unexpected response from the service: {0}")]
    InvalidResponse(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct IrisClient {
    base_url: String,
    http: reqwest::Client,
}

impl IrisClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::InvalidInput(format!(
                "service URL must start with http:// or https://, got {base_url:?}"
            )));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::InvalidInput(format!("HTTP client setup failed: {e}")))?;
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn info(&self) -> Result<ServiceInfo, ClientError> {
        let url = self.endpoint("/");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| ClientError::Unreachable { url, source })?;
        decode(response).await
    }

    pub async fn predict(&self, features: &FeatureVector) -> Result<Species, ClientError> {
        let url = self.endpoint(PREDICT_PATH);
        debug!("POST {} {:?}", url, features);
        let response = self
            .http
            .post(&url)
            .json(features)
            .send()
            .await
            .map_err(|source| ClientError::Unreachable { url, source })?;
        let body: PredictionResponse = decode(response).await?;
        to_species(body.prediction)
    }

    /// Labels come back in input order.
    pub async fn predict_batch(
        &self,
        feature_list: &[FeatureVector],
    ) -> Result<Vec<Species>, ClientError> {
        let url = self.endpoint(BATCH_PREDICT_PATH);
        debug!("POST {} ({} items)", url, feature_list.len());
        let request = BatchPredictRequest {
            feature_list: feature_list.to_vec(),
        };
        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|source| ClientError::Unreachable { url, source })?;
        let labels: Vec<u8> = decode(response).await?;
        if labels.len() != feature_list.len() {
            return Err(ClientError::InvalidResponse(format!(
                "sent {} items but received {} predictions",
                feature_list.len(),
                labels.len()
            )));
        }
        labels.into_iter().map(to_species).collect()
    }

    /// Splits large inputs into requests of at most `chunk_size` items and
    /// concatenates the results in order.
    pub async fn predict_chunked(
        &self,
        feature_list: &[FeatureVector],
        chunk_size: usize,
    ) -> Result<Vec<Species>, ClientError> {
        if chunk_size == 0 {
            return Err(ClientError::InvalidInput("chunk size must be at least 1".into()));
        }
        if feature_list.is_empty() {
            return self.predict_batch(feature_list).await;
        }
        let mut out = Vec::with_capacity(feature_list.len());
        for chunk in feature_list.chunks(chunk_size) {
            out.extend(self.predict_batch(chunk).await?);
        }
        Ok(out)
    }
}

fn to_species(label: u8) -> Result<Species, ClientError> {
    Species::try_from(label).map_err(|e| ClientError::InvalidResponse(e.to_string()))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()));
    }

    let text = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => body.message,
        Err(_) if text.is_empty() => status
            .canonical_reason()
            .unwrap_or("no details")
            .to_string(),
        Err(_) => text,
    };
    Err(classify_status(status, message))
}

pub(crate) fn classify_status(status: StatusCode, message: String) -> ClientError {
    if status.is_client_error() {
        ClientError::Rejected {
            status: status.as_u16(),
            message,
        }
    } else {
        ClientError::ServerError {
            status: status.as_u16(),
            message,
        }
    }
}
