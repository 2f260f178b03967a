//! RUETL Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, logging, and error handling for the RUETL workspace.
//!
//! # Overview
//!
//! This crate provides functionality used by both the pipeline and the
//! monitor binaries:
//!
//! - **Error Handling**: the [`EtlError`] type and [`Result`] alias
//! - **Logging**: structured JSON logging to console and/or a fixed log file
//! - **Types**: batch outcome reporting shared across pipeline stages

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{EtlError, Result};
pub use types::{BatchOutcome, RecordErrorKind, RecordFailure};
