//! RUETL - Random-user ETL pipeline

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use ruetl_common::logging::{init_logging, LogConfig, LogLevel};
use ruetl_pipeline::{config::PipelineConfig, export, load, pipeline, transform};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "ruetl")]
#[command(author, version, about = "Random-user ETL pipeline")]
struct Cli {
    /// Stage to run (full pipeline when omitted)
    #[command(subcommand)]
    stage: Option<Stage>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Parser, Debug)]
enum Stage {
    /// Run the full pipeline
    Run,

    /// Transform the raw batch file into the normalized batch file
    Transform,

    /// Load the normalized batch file into identities and profiles
    Load,

    /// Export the joined identities/profiles to a JSON file
    Export,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbose flag
    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig {
        level: log_level,
        ..LogConfig::default()
    };

    // Environment variables take precedence over the verbose flag
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    init_logging(&log_config)?;

    let config = PipelineConfig::load()?;

    match cli.stage.unwrap_or(Stage::Run) {
        Stage::Run => {
            pipeline::run_pipeline(&config).await?;
        },
        Stage::Transform => {
            info!("Running transform stage");
            let now = Utc::now().naive_utc();
            let outcome = transform::run_transform(
                &config.files.raw_path,
                &config.files.processed_path,
                now,
            )?;
            info!(
                transformed = outcome.succeeded,
                skipped = outcome.failures.len(),
                "Transform complete"
            );
        },
        Stage::Load => {
            info!("Running structured load stage");
            let pool = pipeline::connect_pool(&config).await?;
            let outcome = load::run_load(&pool, &config.files.processed_path).await?;
            info!(
                loaded = outcome.succeeded,
                skipped = outcome.failures.len(),
                "Structured load complete"
            );
        },
        Stage::Export => {
            info!("Running export stage");
            let pool = pipeline::connect_pool(&config).await?;
            let count = export::export(&pool, &config.files.export_path).await?;
            info!(exported = count, "Export complete");
        },
    }

    Ok(())
}
