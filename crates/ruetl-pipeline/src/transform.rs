//! Raw record normalization
//!
//! Each raw record is transformed independently into a flat
//! [`NormalizedRecord`]: stable identity key, computed age, title-cased
//! names and locations, stringified ZIP, and defaults for absent fields.
//! A record that cannot be transformed is skipped and reported in the
//! batch outcome; it never aborts the rest of the batch.
//!
//! The reference time is an explicit parameter so the age computation is a
//! pure function of birth date and "now".

use crate::extract::RawRecord;
use chrono::NaiveDateTime;
use ruetl_common::{BatchOutcome, EtlError, RecordErrorKind, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::{info, warn};

/// Fixed birth-date format used by the external API.
pub const DOB_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Flattened record derived from one raw user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub id: String,
    pub username: String,
    pub full_name: String,
    /// ISO-8601, no zone suffix
    pub date_of_birth: String,
    /// Whole years, `days / 365` approximation
    pub age: i64,
    pub gender: String,
    pub state: String,
    pub city: String,
    pub zip: String,
    pub picture_url: String,
    pub cell: String,
}

// Typed view of the fields the transformer reads. Container objects are
// required (a record without them is malformed); leaf fields are optional
// and defaulted.
#[derive(Debug, Deserialize)]
struct RawUser {
    id: RawId,
    login: RawLogin,
    name: RawName,
    dob: RawDob,
    location: RawLocation,
    picture: RawPicture,
    gender: Option<String>,
    cell: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawId {
    #[serde(default)]
    name: Option<Value>,
    #[serde(default)]
    value: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawLogin {
    #[serde(default)]
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawName {
    first: String,
    last: String,
}

#[derive(Debug, Deserialize)]
struct RawDob {
    date: String,
}

#[derive(Debug, Deserialize)]
struct RawLocation {
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    postcode: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawPicture {
    #[serde(default)]
    large: Option<String>,
}

/// Render an optional JSON scalar as plain text
///
/// Strings render without surrounding quotes, numbers verbatim; absent and
/// null values render empty.
fn scalar_text(value: &Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Derive the stable identity key from the nested id object
///
/// Concatenates the naming scheme and value (absent parts default to empty,
/// so a partial key is possible), then strips spaces and quote characters.
pub fn derive_identity_id(name: &Option<Value>, value: &Option<Value>) -> String {
    let joined = format!("{}{}", scalar_text(name), scalar_text(value));
    joined.chars().filter(|c| *c != ' ' && *c != '"').collect()
}

/// Title-case a string: uppercase every letter that follows a non-letter,
/// lowercase the rest
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Age in whole years as `floor(elapsed days / 365)`
///
/// Deliberately ignores leap years and calendar month/day boundaries;
/// downstream consumers depend on this exact approximation.
pub fn compute_age(birth_date: NaiveDateTime, now: NaiveDateTime) -> i64 {
    (now - birth_date).num_days() / 365
}

/// Transform one raw record
///
/// Returns the per-record error kind and detail on failure so the caller
/// can report it in the batch outcome.
fn transform_record(
    record: &RawRecord,
    now: NaiveDateTime,
) -> std::result::Result<NormalizedRecord, (RecordErrorKind, String)> {
    let user: RawUser = serde_json::from_value(record.clone())
        .map_err(|e| (RecordErrorKind::MalformedRecord, e.to_string()))?;

    let birth_date = NaiveDateTime::parse_from_str(&user.dob.date, DOB_FORMAT)
        .map_err(|e| (RecordErrorKind::MalformedDate, e.to_string()))?;

    let state = user.location.state.unwrap_or_else(|| "unknown".to_string());
    let city = user.location.city.unwrap_or_else(|| "unknown".to_string());

    let zip = match user.location.postcode {
        Some(postcode) => scalar_text(&Some(postcode)),
        None => "unknown".to_string(),
    };

    Ok(NormalizedRecord {
        id: derive_identity_id(&user.id.name, &user.id.value),
        username: user.login.username.unwrap_or_else(|| "unknown".to_string()),
        full_name: title_case(&format!("{} {}", user.name.first, user.name.last)),
        date_of_birth: birth_date.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
        age: compute_age(birth_date, now),
        gender: user.gender.unwrap_or_else(|| "unknown".to_string()),
        state: title_case(&state),
        city: title_case(&city),
        zip,
        picture_url: user.picture.large.unwrap_or_default(),
        cell: user.cell.unwrap_or_else(|| "N/A".to_string()),
    })
}

/// Transform a whole raw batch
///
/// Records are processed independently; failures are collected into the
/// outcome and the remaining records continue.
pub fn transform_batch(
    records: &[RawRecord],
    now: NaiveDateTime,
) -> (Vec<NormalizedRecord>, BatchOutcome) {
    let mut normalized = Vec::with_capacity(records.len());
    let mut outcome = BatchOutcome::new();

    for (index, record) in records.iter().enumerate() {
        match transform_record(record, now) {
            Ok(rec) => {
                outcome.record_success();
                normalized.push(rec);
            },
            Err((kind, detail)) => {
                warn!(record = index, kind = %kind, detail = %detail, "Skipping record during transform");
                outcome.record_failure(format!("record {}", index), kind, detail);
            },
        }
    }

    (normalized, outcome)
}

/// Transform the raw batch file into the normalized batch file
///
/// An absent raw file is a missing-precondition error: nothing is written.
/// An empty raw batch is logged as a warning and also writes nothing. On
/// success the processed file is overwritten wholesale (last run wins).
pub fn run_transform(
    raw_path: &Path,
    processed_path: &Path,
    now: NaiveDateTime,
) -> Result<BatchOutcome> {
    if !raw_path.exists() {
        return Err(EtlError::MissingInput(raw_path.display().to_string()));
    }

    let contents = std::fs::read_to_string(raw_path)?;
    let records: Vec<RawRecord> = serde_json::from_str(&contents)?;

    if records.is_empty() {
        warn!(path = %raw_path.display(), "No records found in raw batch file");
        return Ok(BatchOutcome::new());
    }

    let (normalized, outcome) = transform_batch(&records, now);

    if let Some(parent) = processed_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(processed_path, serde_json::to_string_pretty(&normalized)?)?;

    info!(
        transformed = outcome.succeeded,
        skipped = outcome.failures.len(),
        path = %processed_path.display(),
        "Normalized batch written"
    );
    Ok(outcome)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn reference_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn sample_user() -> RawRecord {
        json!({
            "gender": "female",
            "name": {"title": "Ms", "first": "jane", "last": "doe"},
            "location": {
                "city": "new york",
                "state": "new york",
                "postcode": 10001
            },
            "login": {"username": "janedoe42"},
            "dob": {"date": "1990-05-15T00:00:00.000Z"},
            "cell": "012-345-6789",
            "id": {"name": "SSN", "value": "123-45-6789"},
            "picture": {"large": "https://example.com/jane.jpg"}
        })
    }

    #[test]
    fn test_identity_id_concatenates_name_and_value() {
        let id = derive_identity_id(
            &Some(json!("SSN")),
            &Some(json!("123-45-6789")),
        );
        assert_eq!(id, "SSN123-45-6789");
    }

    #[test]
    fn test_identity_id_strips_spaces_and_quotes() {
        let id = derive_identity_id(
            &Some(json!("BSN N")),
            &Some(json!("12 \"34\" 56")),
        );
        assert_eq!(id, "BSNN123456");
    }

    #[test]
    fn test_identity_id_with_absent_parts_is_partial() {
        assert_eq!(derive_identity_id(&Some(json!("INSEE")), &None), "INSEE");
        assert_eq!(derive_identity_id(&None, &Some(json!("42"))), "42");
        assert_eq!(derive_identity_id(&None, &None), "");
    }

    #[test]
    fn test_identity_id_renders_numeric_value() {
        let id = derive_identity_id(&Some(json!("CPF")), &Some(json!(987654321)));
        assert_eq!(id, "CPF987654321");
    }

    #[test]
    fn test_identity_id_treats_null_as_absent() {
        let id = derive_identity_id(&Some(json!("TFN")), &Some(Value::Null));
        assert_eq!(id, "TFN");
    }

    #[test]
    fn test_age_on_birthday_boundary() {
        // 1990-05-15 → 2025-05-15 spans nine leap days, so days/365
        // already crosses the 35-year mark.
        let birth = NaiveDate::from_ymd_opt(1990, 5, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(compute_age(birth, reference_now()), 35);
    }

    #[test]
    fn test_age_is_floored() {
        let birth = NaiveDate::from_ymd_opt(2001, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let now = NaiveDate::from_ymd_opt(2001, 12, 31)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(compute_age(birth, now), 0);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("jane doe"), "Jane Doe");
        assert_eq!(title_case("NEW YORK"), "New York");
        assert_eq!(title_case("o'brien"), "O'Brien");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_transform_full_record() {
        let (records, outcome) = transform_batch(&[sample_user()], reference_now());
        assert!(outcome.is_clean());
        assert_eq!(records.len(), 1);

        let rec = &records[0];
        assert_eq!(rec.id, "SSN123-45-6789");
        assert_eq!(rec.username, "janedoe42");
        assert_eq!(rec.full_name, "Jane Doe");
        assert_eq!(rec.date_of_birth, "1990-05-15T00:00:00");
        assert_eq!(rec.age, 35);
        assert_eq!(rec.gender, "female");
        assert_eq!(rec.state, "New York");
        assert_eq!(rec.city, "New York");
        assert_eq!(rec.zip, "10001");
        assert_eq!(rec.picture_url, "https://example.com/jane.jpg");
        assert_eq!(rec.cell, "012-345-6789");
    }

    #[test]
    fn test_missing_optional_fields_are_defaulted() {
        let mut user = sample_user();
        user.as_object_mut().unwrap().remove("gender");
        user.as_object_mut().unwrap().remove("cell");
        user["login"] = json!({});
        user["location"] = json!({});

        let (records, outcome) = transform_batch(&[user], reference_now());
        assert!(outcome.is_clean());

        let rec = &records[0];
        assert_eq!(rec.gender, "unknown");
        assert_eq!(rec.cell, "N/A");
        assert_eq!(rec.username, "unknown");
        assert_eq!(rec.state, "Unknown");
        assert_eq!(rec.city, "Unknown");
        assert_eq!(rec.zip, "unknown");
    }

    #[test]
    fn test_string_postcode_is_preserved() {
        let mut user = sample_user();
        user["location"]["postcode"] = json!("EC1A 1BB");
        let (records, _) = transform_batch(&[user], reference_now());
        assert_eq!(records[0].zip, "EC1A 1BB");
    }

    #[test]
    fn test_malformed_date_skips_record_only() {
        let mut bad = sample_user();
        bad["dob"]["date"] = json!("15/05/1990");
        let good = sample_user();

        let (records, outcome) = transform_batch(&[bad, good], reference_now());
        assert_eq!(records.len(), 1);
        assert_eq!(outcome.succeeded, 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].kind, RecordErrorKind::MalformedDate);
    }

    #[test]
    fn test_record_without_name_object_is_malformed() {
        let mut bad = sample_user();
        bad.as_object_mut().unwrap().remove("name");

        let (records, outcome) = transform_batch(&[bad], reference_now());
        assert!(records.is_empty());
        assert_eq!(outcome.failures[0].kind, RecordErrorKind::MalformedRecord);
    }

    #[test]
    fn test_run_transform_missing_raw_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let raw = dir.path().join("raw_data.json");
        let processed = dir.path().join("processed_data.json");

        let result = run_transform(&raw, &processed, reference_now());
        assert!(matches!(result, Err(EtlError::MissingInput(_))));
        assert!(!processed.exists());
    }

    #[test]
    fn test_run_transform_empty_batch_writes_nothing() {
        let dir = tempfile::TempDir::new().unwrap();
        let raw = dir.path().join("raw_data.json");
        let processed = dir.path().join("processed_data.json");
        std::fs::write(&raw, "[]").unwrap();

        let outcome = run_transform(&raw, &processed, reference_now()).unwrap();
        assert_eq!(outcome.total(), 0);
        assert!(!processed.exists());
    }

    #[test]
    fn test_run_transform_overwrites_processed_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let raw = dir.path().join("raw_data.json");
        let processed = dir.path().join("processed_data.json");
        std::fs::write(&processed, "stale contents").unwrap();
        std::fs::write(&raw, serde_json::to_string(&vec![sample_user()]).unwrap()).unwrap();

        run_transform(&raw, &processed, reference_now()).unwrap();

        let written: Vec<NormalizedRecord> =
            serde_json::from_str(&std::fs::read_to_string(&processed).unwrap()).unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].id, "SSN123-45-6789");
    }
}
