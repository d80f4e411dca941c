use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use crate::util::config::ServiceConfig;

#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Iris classifier inference service")]
pub struct Args {
    /// TOML config file; flags given on the command line override its values
    #[arg(short, long, env = "IRIS_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "IRIS_HOST")]
    pub host: Option<String>,

    #[arg(short, long, env = "IRIS_PORT")]
    pub port: Option<u16>,

    /// Serialized KNN model (.json or bincode)
    #[arg(short, long, env = "IRIS_MODEL_PATH")]
    pub model_path: Option<PathBuf>,

    /// Exit instead of serving in degraded mode when the model fails to load
    #[arg(long, env = "IRIS_REQUIRE_MODEL")]
    pub require_model: bool,

    #[arg(long, env = "IRIS_MAX_BATCH_SIZE")]
    pub max_batch_size: Option<usize>,

    #[arg(long, env = "IRIS_REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: Option<u64>,

    #[arg(long, env = "IRIS_MAX_BODY_BYTES")]
    pub max_body_bytes: Option<usize>,

    #[arg(long, env = "IRIS_TRUST_FORWARDED_FOR")]
    pub trust_forwarded_for: bool,
}

impl Args {
    pub fn load_config(self) -> Result<ServiceConfig> {
        let mut config = match &self.config {
            Some(path) => {
                info!("Loading config from {}", path.display());
                ServiceConfig::from_file(path)?
            }
            None => ServiceConfig::default(),
        };

        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(model_path) = self.model_path {
            config.model_path = model_path;
        }
        if self.require_model {
            config.require_model = true;
        }
        if let Some(n) = self.max_batch_size {
            config.max_batch_size = n;
        }
        if let Some(secs) = self.request_timeout_secs {
            config.request_timeout_secs = secs;
        }
        if let Some(bytes) = self.max_body_bytes {
            config.max_body_bytes = bytes;
        }
        if self.trust_forwarded_for {
            config.trust_forwarded_for = true;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_cli_overrides_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("iris.toml");
        fs::write(&path, "port = 9000\nmax_batch_size = 64\n")?;

        let args = Args::try_parse_from([
            "iris-s",
            "--config",
            path.to_str().unwrap(),
            "--port",
            "9100",
            "--require-model",
        ])?;
        let config = args.load_config()?;
        assert_eq!(config.port, 9100);
        assert_eq!(config.max_batch_size, 64);
        assert!(config.require_model);
        Ok(())
    }

    #[test]
    fn test_defaults_without_file() -> Result<()> {
        let config = Args::default().load_config()?;
        assert_eq!(config, ServiceConfig::default());
        Ok(())
    }
}
