use super::*;

use anyhow::{Context, Result};
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use common::{BATCH_PREDICT_PATH, HEALTH_PATH, METRICS_PATH, PREDICT_PATH};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::api_server::{info, predict};
use crate::error::ServiceError;
use crate::util::config::ServiceConfig;

impl ApiServer {
    /// Serves until `shutdown` resolves, then unloads the model.
    pub async fn run_api_server<F>(self: Arc<Self>, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.bind_addr();
        let app = Arc::clone(&self).create_api_router();
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind to {addr}"))?;

        info!("Iris API server listening on {}", addr);

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server error")?;

        info!("Server stopped, releasing model");
        self.models.shutdown().await;
        Ok(())
    }

    // Create API Router
    pub fn create_api_router(self: Arc<Self>) -> Router {
        let routes = Router::new()
            .route("/", get(info::service_info))
            .route(HEALTH_PATH, get(info::health))
            .route(METRICS_PATH, get(info::metrics))
            .route(PREDICT_PATH, post(predict::predict))
            .route(BATCH_PREDICT_PATH, post(predict::predict_batch));
        with_service_layers(routes, &self.config).with_state(self)
    }
}

/// Body limit, request timeout, tracing and CORS, applied to every route.
pub fn with_service_layers<S>(router: Router<S>, config: &ServiceConfig) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(middleware::from_fn_with_state(
            config.request_timeout(),
            enforce_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

// Timed-out requests get the same JSON error body as every other failure.
async fn enforce_timeout(State(limit): State<Duration>, request: Request, next: Next) -> Response {
    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => ServiceError::Timeout(format!(
            "request did not complete within {} s",
            limit.as_secs_f64()
        ))
        .into_response(),
    }
}
