//! Pipeline orchestration
//!
//! Sequences the stages strictly forward: schema → extract → raw persistence
//! → staging population → transform → structured load → export. Apart from
//! schema setup (whose failure aborts the run), a failed stage is logged
//! and the pipeline proceeds with degraded or empty input, so the final
//! completion log line is always reached.

use crate::{config::PipelineConfig, export, extract, load, raw, schema, transform};
use chrono::Utc;
use ruetl_common::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{error, info};

/// Open the database pool described by the configuration
pub async fn connect_pool(config: &PipelineConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(config.database.connect_timeout_secs))
        .connect(&config.database.url)
        .await?;
    Ok(pool)
}

/// Run the full pipeline once
///
/// Returns an error only when the database is unreachable or the schema
/// cannot be ensured; every later stage degrades instead of aborting.
pub async fn run_pipeline(config: &PipelineConfig) -> Result<()> {
    info!("Pipeline execution started");

    let pool = match connect_pool(config).await {
        Ok(pool) => pool,
        Err(e) => {
            error!(error = %e, "Failed to connect to database, aborting run");
            return Err(e);
        },
    };

    if let Err(e) = schema::ensure_schema(&pool).await {
        error!(error = %e, "Failed to ensure database schema, aborting run");
        return Err(e);
    }

    let client = reqwest::Client::new();
    let users = match extract::fetch_random_users(
        &client,
        &config.api.base_url,
        config.api.batch_size,
    )
    .await
    {
        Ok(users) => users,
        Err(e) => {
            error!(error = %e, "Failed to fetch users from API, continuing with empty batch");
            Vec::new()
        },
    };

    if !users.is_empty() {
        if let Err(e) = raw::save_raw_to_file(&users, &config.files.raw_path) {
            error!(error = %e, "Failed to save raw batch file");
        }

        match raw::persist_raw(&pool, &users).await {
            Ok(outcome) => {
                info!(staged = outcome.succeeded, skipped = outcome.failures.len(), "Staging complete")
            },
            Err(e) => error!(error = %e, "Failed to stage raw batch"),
        }

        if let Err(e) = raw::populate_from_staging(&pool).await {
            error!(error = %e, "Failed to populate tables from staging");
        }
    }

    let now = Utc::now().naive_utc();
    match transform::run_transform(&config.files.raw_path, &config.files.processed_path, now) {
        Ok(outcome) => info!(
            transformed = outcome.succeeded,
            skipped = outcome.failures.len(),
            "Transform complete"
        ),
        Err(e) => error!(error = %e, "Transform failed"),
    }

    match load::run_load(&pool, &config.files.processed_path).await {
        Ok(outcome) => info!(
            loaded = outcome.succeeded,
            skipped = outcome.failures.len(),
            "Structured load complete"
        ),
        Err(e) => error!(error = %e, "Structured load failed"),
    }

    match export::export(&pool, &config.files.export_path).await {
        Ok(count) => info!(exported = count, "Export complete"),
        Err(e) => error!(error = %e, "Export failed"),
    }

    info!("Pipeline execution completed");
    Ok(())
}
