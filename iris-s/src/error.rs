use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::ErrorBody;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    ModelUnavailable(String),

    #[error("{0}")]
    Timeout(String),

    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation_error",
            ServiceError::ModelUnavailable(_) => "model_unavailable",
            ServiceError::Timeout(_) => "timeout",
            ServiceError::Internal(_) => "internal_error",
        }
    }
}

// Every body rejection (missing field, wrong type, bad JSON, wrong content
// type) is a client error.
impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        ServiceError::Validation(rejection.body_text())
    }
}

impl From<prometheus::Error> for ServiceError {
    fn from(e: prometheus::Error) -> Self {
        ServiceError::Internal(format!("metrics: {e}"))
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ServiceError::Internal(msg) => error!("Internal error: {}", msg),
            other => warn!("Rejected request ({}): {}", other.kind(), other),
        }
        let body = ErrorBody::new(self.kind(), self.to_string(), status.as_u16());
        (status, Json(body)).into_response()
    }
}
