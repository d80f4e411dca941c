use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, State},
    http::HeaderMap,
    Json,
};
use common::{
    BatchPredictRequest, FeatureVector, PredictionResponse, BATCH_PREDICT_PATH, PREDICT_PATH,
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use crate::api_server::ApiServer;
use crate::error::ServiceError;

const UNKNOWN_CLIENT: &str = "unknown";

/// Address used as the `ip_address` metrics label. A forwarded hop that is
/// not a literal IP address is ignored so header values never become labels.
pub fn client_ip(
    headers: &HeaderMap,
    connect_info: Option<&ConnectInfo<SocketAddr>>,
    trust_forwarded_for: bool,
) -> String {
    if trust_forwarded_for {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }
    connect_info
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

pub async fn predict(
    State(server): State<Arc<ApiServer>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    payload: Result<Json<FeatureVector>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ServiceError> {
    let Json(features) = payload?;
    let ip = client_ip(
        &headers,
        connect_info.as_ref(),
        server.config.trust_forwarded_for,
    );

    let species = server.classify(&features, &ip, PREDICT_PATH).await?;
    Ok(Json(PredictionResponse {
        prediction: species.label(),
    }))
}

pub async fn predict_batch(
    State(server): State<Arc<ApiServer>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    payload: Result<Json<BatchPredictRequest>, JsonRejection>,
) -> Result<Json<Vec<u8>>, ServiceError> {
    let Json(request) = payload?;
    let ip = client_ip(
        &headers,
        connect_info.as_ref(),
        server.config.trust_forwarded_for,
    );

    let predictions = server
        .classify_batch(&request.feature_list, &ip, BATCH_PREDICT_PATH)
        .await?;
    Ok(Json(predictions.into_iter().map(|s| s.label()).collect()))
}
