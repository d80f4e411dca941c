use crate::model::knn::{KnnModel, ModelLoadError};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

/// Where the process stands with respect to its model.
#[derive(Debug, Clone)]
pub enum ModelState {
    Loaded(Arc<KnnModel>),
    Failed(String),
    Unloaded,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ModelStatusKind {
    Loaded,
    Failed,
    Unloaded,
}

#[derive(Serialize, Debug, Clone)]
pub struct ModelStatus {
    pub state: ModelStatusKind,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_samples: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_neighbors: Option<u32>,
}

/// Owns the model for the lifetime of the service.
///
/// Readers clone the `Arc` out of the state and run inference with no lock
/// held; the write lock is only taken by `shutdown`.
pub struct ModelManager {
    path: PathBuf,
    state: RwLock<ModelState>,
}

impl ModelManager {
    /// Loads the artifact at `path`. A failure is recorded as
    /// `ModelState::Failed` and the manager is still returned, which puts the
    /// service in degraded mode.
    pub fn initialize<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let state = match KnnModel::from_file(&path) {
            Ok(model) => {
                info!(
                    "Model loaded successfully from {} ({} samples, k={})",
                    path.display(),
                    model.len(),
                    model.n_neighbors
                );
                ModelState::Loaded(Arc::new(model))
            }
            Err(e) => {
                error!("Failed to load model from {}: {}", path.display(), e);
                warn!("Serving in degraded mode, predictions will be rejected");
                ModelState::Failed(e.to_string())
            }
        };
        Self {
            path,
            state: RwLock::new(state),
        }
    }

    /// Like `initialize`, but a load failure is returned to the caller.
    pub fn initialize_strict<P: AsRef<Path>>(path: P) -> Result<Self, ModelLoadError> {
        let path = path.as_ref().to_path_buf();
        let model = KnnModel::from_file(&path)?;
        info!(
            "Model loaded successfully from {} ({} samples, k={})",
            path.display(),
            model.len(),
            model.n_neighbors
        );
        Ok(Self::with_model(path, model))
    }

    pub fn with_model<P: AsRef<Path>>(path: P, model: KnnModel) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            state: RwLock::new(ModelState::Loaded(Arc::new(model))),
        }
    }

    /// The model if one is loaded, otherwise the reason it is not.
    pub async fn current(&self) -> Result<Arc<KnnModel>, String> {
        match &*self.state.read().await {
            ModelState::Loaded(model) => Ok(Arc::clone(model)),
            ModelState::Failed(reason) => Err(format!("model failed to load: {reason}")),
            ModelState::Unloaded => Err("model has been unloaded".to_string()),
        }
    }

    pub async fn status(&self) -> ModelStatus {
        let path = self.path.display().to_string();
        match &*self.state.read().await {
            ModelState::Loaded(model) => ModelStatus {
                state: ModelStatusKind::Loaded,
                path,
                reason: None,
                n_samples: Some(model.len()),
                n_neighbors: Some(model.n_neighbors),
            },
            ModelState::Failed(reason) => ModelStatus {
                state: ModelStatusKind::Failed,
                path,
                reason: Some(reason.clone()),
                n_samples: None,
                n_neighbors: None,
            },
            ModelState::Unloaded => ModelStatus {
                state: ModelStatusKind::Unloaded,
                path,
                reason: None,
                n_samples: None,
                n_neighbors: None,
            },
        }
    }

    /// Drops the service's reference to the model. Safe to call repeatedly.
    pub async fn shutdown(&self) {
        let mut state = self.state.write().await;
        if matches!(*state, ModelState::Loaded(_)) {
            info!("Unloading model {}", self.path.display());
        }
        *state = ModelState::Unloaded;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> KnnModel {
        KnnModel::new(1, vec![[1.0; 4], [5.0; 4]], vec![0, 2]).unwrap()
    }

    #[tokio::test]
    async fn test_missing_artifact_degrades() {
        let manager = ModelManager::initialize("/nonexistent/knn_model.json");
        let err = manager.current().await.unwrap_err();
        assert!(err.contains("failed to load"), "{err}");
        let status = manager.status().await;
        assert_eq!(status.state, ModelStatusKind::Failed);
        assert!(status.reason.is_some());
    }

    #[tokio::test]
    async fn test_strict_initialize_fails() {
        assert!(ModelManager::initialize_strict("/nonexistent/knn_model.bin").is_err());
    }

    #[tokio::test]
    async fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("knn_model.bin");
        std::fs::write(&path, model().to_bincode().unwrap()).unwrap();

        let manager = ModelManager::initialize(&path);
        let loaded = manager.current().await.unwrap();
        assert_eq!(*loaded, model());
        assert_eq!(manager.status().await.n_samples, Some(2));
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let manager = ModelManager::with_model("mem", model());
        let held = manager.current().await.unwrap();

        manager.shutdown().await;
        manager.shutdown().await;

        assert!(manager.current().await.is_err());
        assert_eq!(manager.status().await.state, ModelStatusKind::Unloaded);
        // in-flight holders keep their reference
        assert_eq!(held.len(), 2);
    }
}
