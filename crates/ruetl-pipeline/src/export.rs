//! Structured table export
//!
//! Joins identities back to profiles and writes the result as a flat JSON
//! array for downstream consumption. The join is a LEFT JOIN, so an
//! identity that never received a profile still appears, with null profile
//! fields.

use chrono::NaiveDateTime;
use ruetl_common::Result;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use std::path::Path;
use tracing::info;

const EXPORT_QUERY: &str = r#"
SELECT
    i.id,
    i.username,
    p.date_of_birth,
    p.gender,
    p.state,
    p.city,
    p.zip,
    p.picture_url,
    p.cell
FROM identities i
LEFT JOIN profiles p ON p.identity_id = i.id
ORDER BY i.id
"#;

/// One exported row; profile fields are null when no profile exists
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedRecord {
    pub id: String,
    pub username: Option<String>,
    /// ISO-8601, no zone suffix
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub picture_url: Option<String>,
    pub cell: Option<String>,
}

/// Export the joined identities/profiles to a JSON array file
///
/// Overwrites any prior export. Returns the number of rows written.
pub async fn export(pool: &PgPool, path: &Path) -> Result<usize> {
    let rows = sqlx::query(EXPORT_QUERY).fetch_all(pool).await?;

    let records: Vec<ExportedRecord> = rows
        .iter()
        .map(|row| {
            Ok(ExportedRecord {
                id: row.try_get("id")?,
                username: row.try_get("username")?,
                date_of_birth: row
                    .try_get::<Option<NaiveDateTime>, _>("date_of_birth")?
                    .map(|ts| ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
                gender: row.try_get("gender")?,
                state: row.try_get("state")?,
                city: row.try_get("city")?,
                zip: row.try_get("zip")?,
                picture_url: row.try_get("picture_url")?,
                cell: row.try_get("cell")?,
            })
        })
        .collect::<Result<_>>()?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(&records)?)?;

    info!(count = records.len(), path = %path.display(), "Export written");
    Ok(records.len())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_export_query_is_left_join() {
        // Identities without a profile must still be exported.
        assert!(EXPORT_QUERY.contains("LEFT JOIN profiles"));
    }

    #[test]
    fn test_exported_record_preserves_nulls() {
        let record = ExportedRecord {
            id: "SSN123".to_string(),
            username: Some("janedoe42".to_string()),
            date_of_birth: None,
            gender: None,
            state: None,
            city: None,
            zip: None,
            picture_url: None,
            cell: None,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], "SSN123");
        assert!(json["date_of_birth"].is_null());
        assert!(json["gender"].is_null());
        // Null fields must be present, not skipped.
        assert!(json.as_object().unwrap().contains_key("cell"));
    }
}
