//! RUETL Pipeline Library
//!
//! Batch ETL for synthetic user records: extract from the random-user API,
//! stage the raw payloads, normalize a subset of fields, and load the
//! normalized records into relational tables with insert-ignore-on-conflict
//! semantics.
//!
//! # Stages
//!
//! - **schema**: idempotent DDL for the staging and structured tables
//! - **extract**: single best-effort fetch from the external API
//! - **raw**: raw payload persistence (staging table + audit file)
//! - **transform**: per-record normalization into [`transform::NormalizedRecord`]
//! - **load**: insert-ignore upserts into identities and profiles
//! - **export**: left-joined snapshot of the structured tables
//! - **pipeline**: sequences the stages and logs each outcome
//!
//! # Example
//!
//! ```no_run
//! use ruetl_pipeline::{config::PipelineConfig, pipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = PipelineConfig::load()?;
//!     pipeline::run_pipeline(&config).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod export;
pub mod extract;
pub mod load;
pub mod pipeline;
pub mod raw;
pub mod schema;
pub mod transform;
