use anyhow::Result;
use clap::Parser;
use iris_s::{
    util::{cmd::Args, init_logging},
    ApiServer,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let config = Args::parse().load_config()?;
    info!("Starting with config: {:?}", config);

    let server_state = Arc::new(ApiServer::new(config)?);
    server_state.run_api_server(shutdown_signal()).await
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, shutting down gracefully...");
                    }
                    _ = sigint.recv() => {
                        info!("Received SIGINT, shutting down gracefully...");
                    }
                }
            }
            _ => {
                tracing::warn!("Failed to install signal listeners, falling back to Ctrl-C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received Ctrl-C, shutting down gracefully...");
    }
}
