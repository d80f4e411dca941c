pub mod handle_api;
pub mod info;
pub mod predict;

use anyhow::{Context, Result};
use common::{FeatureVector, Species};
use std::sync::Arc;
use tracing::debug;

use crate::error::ServiceError;
use crate::metrics::PredictionMetrics;
use crate::model::{KnnModel, ModelManager};
use crate::util::config::ServiceConfig;

/// Everything a request handler needs: the model, the metrics registry and
/// the runtime settings. Built once at startup and shared through axum state.
pub struct ApiServer {
    pub config: ServiceConfig,
    pub models: ModelManager,
    pub metrics: PredictionMetrics,
}

impl ApiServer {
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let models = if config.require_model {
            ModelManager::initialize_strict(&config.model_path).with_context(|| {
                format!(
                    "Model is required but could not be loaded from {}",
                    config.model_path.display()
                )
            })?
        } else {
            ModelManager::initialize(&config.model_path)
        };
        Self::with_manager(config, models)
    }

    pub fn with_manager(config: ServiceConfig, models: ModelManager) -> Result<Self> {
        let metrics = PredictionMetrics::new().context("Failed to register metrics")?;
        Ok(Self {
            config,
            models,
            metrics,
        })
    }

    async fn model(&self) -> Result<Arc<KnnModel>, ServiceError> {
        self.models.current().await.map_err(ServiceError::ModelUnavailable)
    }

    /// Runs one prediction and records its metrics under `endpoint`.
    pub async fn classify(
        &self,
        features: &FeatureVector,
        client_ip: &str,
        endpoint: &str,
    ) -> Result<Species, ServiceError> {
        let model = self.model().await?;

        let timer = self.metrics.start_timer(endpoint);
        let species = model.predict(features);
        timer.observe_duration();

        self.metrics.record_prediction(client_ip);
        debug!("{} -> {} for {}", endpoint, species, client_ip);
        Ok(species)
    }

    /// All-or-nothing batch prediction; output index i belongs to input index i.
    /// Metrics are recorded once for the whole call.
    pub async fn classify_batch(
        &self,
        batch: &[FeatureVector],
        client_ip: &str,
        endpoint: &str,
    ) -> Result<Vec<Species>, ServiceError> {
        if batch.len() > self.config.max_batch_size {
            return Err(ServiceError::Validation(format!(
                "feature_list has {} items, the maximum batch size is {}",
                batch.len(),
                self.config.max_batch_size
            )));
        }
        let model = self.model().await?;

        let timer = self.metrics.start_timer(endpoint);
        let predictions = model.predict_batch(batch);
        timer.observe_duration();

        self.metrics.record_prediction(client_ip);
        debug!("{} -> {} predictions for {}", endpoint, predictions.len(), client_ip);
        Ok(predictions)
    }
}
