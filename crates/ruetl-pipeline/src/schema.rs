//! Schema management
//!
//! Idempotent DDL for the three pipeline tables. The statements use
//! `CREATE TABLE IF NOT EXISTS`, so repeated runs are no-ops. `identities`
//! must exist before `profiles` because of the foreign key.

use ruetl_common::Result;
use sqlx::PgPool;
use tracing::info;

/// DDL for the raw-payload staging table, one opaque JSON blob per row.
const CREATE_API_RESULTS: &str = "CREATE TABLE IF NOT EXISTS api_results (raw JSON)";

const CREATE_IDENTITIES: &str = r#"
CREATE TABLE IF NOT EXISTS identities (
    id TEXT NOT NULL PRIMARY KEY,
    username TEXT
)
"#;

const CREATE_PROFILES: &str = r#"
CREATE TABLE IF NOT EXISTS profiles (
    identity_id TEXT NOT NULL UNIQUE REFERENCES identities(id),
    date_of_birth TIMESTAMP,
    gender TEXT,
    state TEXT,
    city TEXT,
    zip TEXT,
    picture_url TEXT,
    cell TEXT
)
"#;

/// Ensure all pipeline tables exist
///
/// Must run before any loader stage. Failure aborts the pipeline run.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(CREATE_API_RESULTS).execute(pool).await?;
    sqlx::query(CREATE_IDENTITIES).execute(pool).await?;
    sqlx::query(CREATE_PROFILES).execute(pool).await?;

    info!("Database schema ensured");
    Ok(())
}
