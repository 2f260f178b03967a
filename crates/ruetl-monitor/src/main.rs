//! RUETL Monitor - Main entry point

use anyhow::Result;
use ruetl_common::logging::{init_logging, LogConfig, LogOutput};
use ruetl_monitor::MonitorConfig;
use std::net::SocketAddr;
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Console-only by default: the monitor must not grow the pipeline log
    // file it reports on.
    let log_config = LogConfig {
        output: LogOutput::Console,
        ..LogConfig::default()
    };
    // Environment variables take precedence over the console-only default
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);
    init_logging(&log_config)?;

    info!("Starting RUETL monitor");

    let config = MonitorConfig::load();
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(log_file = %config.log_file.display(), "Monitor listening on {}", addr);

    let app = ruetl_monitor::router(config);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Monitor shut down gracefully");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
