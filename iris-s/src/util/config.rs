use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_MODEL_PATH: &str = "models/knn_model.json";
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1000;

/// Runtime settings for the inference service.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub model_path: PathBuf,
    /// Refuse to start when the model cannot be loaded instead of serving
    /// in degraded mode.
    pub require_model: bool,
    pub max_batch_size: usize,
    pub request_timeout_secs: u64,
    pub max_body_bytes: usize,
    /// Take the client address for metrics from `X-Forwarded-For`.
    pub trust_forwarded_for: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            require_model: false,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            request_timeout_secs: 10,
            max_body_bytes: 1024 * 1024,
            trust_forwarded_for: false,
        }
    }
}

impl ServiceConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        toml::from_str(&config_str).with_context(|| "Failed to parse config file")
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partial_file_keeps_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("iris.toml");
        fs::write(
            &path,
            r#"
port = 9000
model_path = "/srv/models/knn_model.bin"
max_batch_size = 64
"#,
        )?;

        let config = ServiceConfig::from_file(&path)?;
        assert_eq!(config.port, 9000);
        assert_eq!(config.model_path, PathBuf::from("/srv/models/knn_model.bin"));
        assert_eq!(config.max_batch_size, 64);
        assert_eq!(config.host, "0.0.0.0");
        assert!(!config.require_model);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        Ok(())
    }

    #[test]
    fn test_unknown_key_rejected() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("iris.toml");
        fs::write(&path, "max_batch = 3\n")?;
        assert!(ServiceConfig::from_file(&path).is_err());
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        assert!(ServiceConfig::from_file("/nonexistent/iris.toml").is_err());
    }
}
