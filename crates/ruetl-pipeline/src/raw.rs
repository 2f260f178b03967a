//! Raw payload persistence
//!
//! Extracted records are kept verbatim in two places for audit and replay:
//! a local JSON file holding the whole batch, and the `api_results` staging
//! table holding one JSON blob per row. A SQL-side pass then seeds the
//! structured tables straight from staging, ahead of the file-based
//! transform/load path.

use crate::extract::RawRecord;
use ruetl_common::{BatchOutcome, RecordErrorKind, Result};
use sqlx::PgPool;
use std::path::Path;
use tracing::{info, warn};

/// Save the whole raw batch to a single pretty-printed JSON array
///
/// Parent directories are created as needed; an existing file at `path` is
/// overwritten wholesale.
pub fn save_raw_to_file(records: &[RawRecord], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json)?;

    info!(count = records.len(), path = %path.display(), "Raw batch saved to file");
    Ok(())
}

/// Insert each raw record into the staging table
///
/// One row per record, in extraction order. A failing insert is logged and
/// skipped; the remaining records still go in.
pub async fn persist_raw(pool: &PgPool, records: &[RawRecord]) -> Result<BatchOutcome> {
    let mut outcome = BatchOutcome::new();

    for (index, record) in records.iter().enumerate() {
        let result = sqlx::query("INSERT INTO api_results (raw) VALUES ($1)")
            .bind(sqlx::types::Json(record))
            .execute(pool)
            .await;

        match result {
            Ok(_) => outcome.record_success(),
            Err(e) => {
                warn!(record = index, error = %e, "Failed to stage raw record, skipping");
                outcome.record_failure(
                    format!("record {}", index),
                    RecordErrorKind::Insert,
                    e.to_string(),
                );
            },
        }
    }

    info!(
        staged = outcome.succeeded,
        skipped = outcome.failures.len(),
        "Raw batch staged in api_results"
    );
    Ok(outcome)
}

/// Seed identities and profiles directly from the staging table
///
/// SQL-side counterpart of the file-based transform/load path. Because this
/// pass runs first and conflicting keys are silently dropped (first write
/// wins), it must agree with the transformer on both the derived id
/// (name/value concatenated, spaces and quotes removed) and the stored
/// values (defaults for absent fields, title-cased state/city), otherwise
/// it would pin unnormalized rows that the normalized load can never
/// replace.
pub async fn populate_from_staging(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO identities (id, username)
        SELECT
            regexp_replace(
                concat(raw->'id'->>'name', raw->'id'->>'value'),
                '[" ]', '', 'g'
            ),
            coalesce(raw->'login'->>'username', 'unknown')
        FROM api_results
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO profiles (identity_id, date_of_birth, gender, state, city, zip, picture_url, cell)
        SELECT DISTINCT
            regexp_replace(
                concat(raw->'id'->>'name', raw->'id'->>'value'),
                '[" ]', '', 'g'
            ),
            to_timestamp(raw->'dob'->>'date', 'YYYY-MM-DD"T"HH24:MI:SS.MS"Z"'),
            coalesce(raw->>'gender', 'unknown'),
            initcap(coalesce(raw->'location'->>'state', 'unknown')),
            initcap(coalesce(raw->'location'->>'city', 'unknown')),
            coalesce(raw->'location'->>'postcode', 'unknown'),
            coalesce(raw->'picture'->>'large', ''),
            coalesce(raw->>'cell', 'N/A')
        FROM api_results
        ON CONFLICT (identity_id) DO NOTHING
        "#,
    )
    .execute(pool)
    .await?;

    info!("Identities and profiles populated from staging table");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_save_raw_to_file_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data/raw/raw_data.json");
        let records = vec![json!({"gender": "female"})];

        save_raw_to_file(&records, &path).unwrap();

        let written: Vec<RawRecord> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, records);
    }

    #[test]
    fn test_save_raw_to_file_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("raw_data.json");

        save_raw_to_file(&[json!({"a": 1}), json!({"b": 2})], &path).unwrap();
        save_raw_to_file(&[json!({"c": 3})], &path).unwrap();

        let written: Vec<RawRecord> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0]["c"], 3);
    }

    #[test]
    fn test_save_raw_to_file_is_pretty_printed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("raw_data.json");

        save_raw_to_file(&[json!({"gender": "male"})], &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains('\n'));
    }
}
