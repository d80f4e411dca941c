use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use common::{
    EndpointList, ServiceInfo, BATCH_PREDICT_PATH, HEALTH_PATH, METRICS_PATH, PREDICT_PATH,
};
use serde::Serialize;
use std::sync::Arc;

use crate::api_server::ApiServer;
use crate::error::ServiceError;
use crate::model::{ModelStatus, ModelStatusKind};

pub const SERVICE_NAME: &str = "Iris Classifier API";

pub async fn service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        description: "ML API for iris species classification".to_string(),
        endpoints: EndpointList {
            predict: PREDICT_PATH.to_string(),
            batch_predict: BATCH_PREDICT_PATH.to_string(),
            metrics: METRICS_PATH.to_string(),
            health: HEALTH_PATH.to_string(),
        },
    })
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model: ModelStatus,
}

/// 200 while a model is loaded, 503 in degraded mode or after shutdown.
pub async fn health(State(server): State<Arc<ApiServer>>) -> (StatusCode, Json<HealthResponse>) {
    let model = server.models.status().await;
    let (code, status) = if model.state == ModelStatusKind::Loaded {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };
    (code, Json(HealthResponse { status, model }))
}

pub async fn metrics(State(server): State<Arc<ApiServer>>) -> Result<Response, ServiceError> {
    let body = server.metrics.render()?;
    Ok((
        [(header::CONTENT_TYPE, server.metrics.content_type())],
        body,
    )
        .into_response())
}
