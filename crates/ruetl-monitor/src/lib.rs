//! RUETL Monitor
//!
//! Read-only health/metrics HTTP service for the pipeline. Runs as its own
//! process with no synchronization against pipeline runs: the metrics
//! endpoint reads the log file's size at request time, a best-effort,
//! eventually-consistent view.
//!
//! Endpoints:
//!
//! - `GET /health` — fixed liveness payload, always 200
//! - `GET /metrics` — log file size in bytes plus static status flags

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use std::path::PathBuf;

// ============================================================================
// Monitor Configuration Constants
// ============================================================================

/// Default monitor host binding.
pub const DEFAULT_MONITOR_HOST: &str = "0.0.0.0";

/// Default monitor port.
pub const DEFAULT_MONITOR_PORT: u16 = 5000;

/// Default pipeline log file watched by `/metrics`.
pub const DEFAULT_LOG_FILE: &str = "logs/etl.log";

/// Monitor configuration
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub host: String,
    pub port: u16,
    /// Pipeline log file whose size is reported by `/metrics`
    pub log_file: PathBuf,
}

impl MonitorConfig {
    /// Load configuration from environment and defaults
    pub fn load() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("RUETL_MONITOR_HOST")
                .unwrap_or_else(|_| DEFAULT_MONITOR_HOST.to_string()),
            port: std::env::var("RUETL_MONITOR_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MONITOR_PORT),
            log_file: std::env::var("RUETL_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_LOG_FILE)),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MONITOR_HOST.to_string(),
            port: DEFAULT_MONITOR_PORT,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

/// Build the monitor router
pub fn router(config: MonitorConfig) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(get_metrics))
        .with_state(config)
}

/// Liveness probe; returns a fixed payload regardless of pipeline or
/// database state
async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "message": "Pipeline is running"
        })),
    )
}

/// Coarse operational counters
///
/// `log_file_size` is read at request time (0 if the file is absent); the
/// two status flags are static, not live checks.
async fn get_metrics(State(config): State<MonitorConfig>) -> impl IntoResponse {
    let log_file_size = std::fs::metadata(&config.log_file)
        .map(|meta| meta.len())
        .unwrap_or(0);

    (
        StatusCode::OK,
        Json(json!({
            "log_file_size": log_file_size,
            "database_status": "connected",
            "api_status": "active"
        })),
    )
}
