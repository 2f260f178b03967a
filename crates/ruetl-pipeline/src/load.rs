//! Structured loading
//!
//! Upserts normalized records into `identities` and `profiles` with
//! insert-ignore-on-conflict semantics: a conflicting key drops the new row
//! silently, so the tables are monotonically growing unions across runs and
//! the first write for an id always wins.

use crate::transform::NormalizedRecord;
use chrono::NaiveDateTime;
use ruetl_common::{BatchOutcome, EtlError, RecordErrorKind, Result};
use sqlx::{Acquire, PgPool, Postgres, Transaction};
use std::path::Path;
use tracing::{info, warn};

const INSERT_IDENTITY: &str = r#"
INSERT INTO identities (id, username)
VALUES ($1, $2)
ON CONFLICT (id) DO NOTHING
"#;

const INSERT_PROFILE: &str = r#"
INSERT INTO profiles (identity_id, date_of_birth, gender, state, city, zip, picture_url, cell)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
ON CONFLICT (identity_id) DO NOTHING
"#;

/// Format written by the transformer for `date_of_birth`.
const DATE_OF_BIRTH_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Upsert the normalized batch into identities and profiles
///
/// One transaction per invocation. For each record the identity goes in
/// first, then the profile, so the foreign key always resolves. A failing
/// record is logged with its id and skipped; the rest of the batch
/// continues.
pub async fn load_into_tables(
    pool: &PgPool,
    records: &[NormalizedRecord],
) -> Result<BatchOutcome> {
    let mut outcome = BatchOutcome::new();
    let mut tx = pool.begin().await?;

    for record in records {
        match insert_record(&mut tx, record).await {
            Ok(()) => outcome.record_success(),
            Err(e) => {
                warn!(id = %record.id, error = %e, "Failed to load record, skipping");
                outcome.record_failure(record.id.clone(), RecordErrorKind::Insert, e.to_string());
            },
        }
    }

    tx.commit().await?;

    info!(
        loaded = outcome.succeeded,
        skipped = outcome.failures.len(),
        "Normalized batch loaded into identities and profiles"
    );
    Ok(outcome)
}

async fn insert_record(
    tx: &mut Transaction<'_, Postgres>,
    record: &NormalizedRecord,
) -> Result<()> {
    let date_of_birth = parse_date_of_birth(&record.date_of_birth)?;

    // A nested transaction issues a SAVEPOINT, so a failed record rolls
    // back to it without leaving the outer transaction in the aborted
    // state. Conflicts are not errors (DO NOTHING); this only fires on
    // genuine statement failures.
    let mut savepoint = tx.begin().await?;
    match exec_inserts(&mut savepoint, record, date_of_birth).await {
        Ok(()) => {
            savepoint.commit().await?;
            Ok(())
        },
        Err(e) => {
            savepoint.rollback().await?;
            Err(e)
        },
    }
}

async fn exec_inserts(
    tx: &mut Transaction<'_, Postgres>,
    record: &NormalizedRecord,
    date_of_birth: NaiveDateTime,
) -> Result<()> {
    sqlx::query(INSERT_IDENTITY)
        .bind(&record.id)
        .bind(&record.username)
        .execute(&mut **tx)
        .await?;

    sqlx::query(INSERT_PROFILE)
        .bind(&record.id)
        .bind(date_of_birth)
        .bind(&record.gender)
        .bind(&record.state)
        .bind(&record.city)
        .bind(&record.zip)
        .bind(&record.picture_url)
        .bind(&record.cell)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

fn parse_date_of_birth(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, DATE_OF_BIRTH_FORMAT)
        .map_err(|e| EtlError::Parse(format!("invalid date_of_birth '{}': {}", value, e)))
}

/// Load the processed file into the structured tables
///
/// An absent processed file is a hard stop (logged by the caller, no
/// database writes). An empty batch is a warning and the database is left
/// untouched.
pub async fn run_load(pool: &PgPool, processed_path: &Path) -> Result<BatchOutcome> {
    if !processed_path.exists() {
        return Err(EtlError::MissingInput(processed_path.display().to_string()));
    }

    let contents = std::fs::read_to_string(processed_path)?;
    let records: Vec<NormalizedRecord> = serde_json::from_str(&contents)?;

    if records.is_empty() {
        warn!(path = %processed_path.display(), "No records found in processed file");
        return Ok(BatchOutcome::new());
    }

    load_into_tables(pool, &records).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_inserts_ignore_conflicts() {
        assert!(INSERT_IDENTITY.contains("ON CONFLICT (id) DO NOTHING"));
        assert!(INSERT_PROFILE.contains("ON CONFLICT (identity_id) DO NOTHING"));
    }

    #[test]
    fn test_parse_date_of_birth_without_fraction() {
        let parsed = parse_date_of_birth("1990-05-15T00:00:00").unwrap();
        assert_eq!(parsed.format("%Y-%m-%d").to_string(), "1990-05-15");
    }

    #[test]
    fn test_parse_date_of_birth_with_fraction() {
        assert!(parse_date_of_birth("1990-05-15T12:30:45.123456").is_ok());
    }

    #[test]
    fn test_parse_date_of_birth_rejects_garbage() {
        assert!(parse_date_of_birth("not-a-date").is_err());
        assert!(parse_date_of_birth("15/05/1990").is_err());
    }
}
