//! Configuration management
//!
//! All tunables are supplied by the environment (with `.env` support) and
//! collected into an explicit [`PipelineConfig`] that the orchestrator
//! passes into each stage. No stage reads the environment itself.

use ruetl_common::{EtlError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Pipeline Configuration Constants
// ============================================================================

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/random_user_sample";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default base URL of the random-user API.
pub const DEFAULT_API_BASE_URL: &str = "https://randomuser.me";

/// Default number of records requested per run.
pub const DEFAULT_BATCH_SIZE: u32 = 20;

/// Default path of the raw batch file.
pub const DEFAULT_RAW_PATH: &str = "data/raw/raw_data.json";

/// Default path of the normalized batch file.
pub const DEFAULT_PROCESSED_PATH: &str = "data/processed/processed_data.json";

/// Default path of the exported join file.
pub const DEFAULT_EXPORT_PATH: &str = "data/export/exported_data.json";

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub files: FileConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

/// External API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub batch_size: u32,
}

/// Data file locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub raw_path: PathBuf,
    pub processed_path: PathBuf,
    pub export_path: PathBuf,
}

impl PipelineConfig {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = PipelineConfig {
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_DATABASE_MAX_CONNECTIONS),
                connect_timeout_secs: std::env::var("DATABASE_CONNECT_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS),
            },
            api: ApiConfig {
                base_url: std::env::var("RUETL_API_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string()),
                batch_size: std::env::var("RUETL_BATCH_SIZE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_BATCH_SIZE),
            },
            files: FileConfig {
                raw_path: std::env::var("RUETL_RAW_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from(DEFAULT_RAW_PATH)),
                processed_path: std::env::var("RUETL_PROCESSED_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from(DEFAULT_PROCESSED_PATH)),
                export_path: std::env::var("RUETL_EXPORT_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from(DEFAULT_EXPORT_PATH)),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.database.url.is_empty() {
            return Err(EtlError::Config("DATABASE_URL must not be empty".to_string()));
        }

        if self.api.batch_size == 0 {
            return Err(EtlError::Config(
                "RUETL_BATCH_SIZE must be a positive integer".to_string(),
            ));
        }

        if self.api.base_url.is_empty() {
            return Err(EtlError::Config(
                "RUETL_API_BASE_URL must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
            },
            api: ApiConfig {
                base_url: DEFAULT_API_BASE_URL.to_string(),
                batch_size: DEFAULT_BATCH_SIZE,
            },
            files: FileConfig {
                raw_path: PathBuf::from(DEFAULT_RAW_PATH),
                processed_path: PathBuf::from(DEFAULT_PROCESSED_PATH),
                export_path: PathBuf::from(DEFAULT_EXPORT_PATH),
            },
        }
    }
}
