//! Random-user API extraction
//!
//! Single best-effort fetch against the external API. No retry, no backoff;
//! the orchestrator treats a failed fetch as an empty batch.

use ruetl_common::{EtlError, Result};
use serde::Deserialize;
use tracing::info;

/// One user record exactly as returned by the API. Kept opaque so the
/// staging table and audit file hold the payload verbatim.
pub type RawRecord = serde_json::Value;

/// Envelope shape of the API response
#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    results: Vec<RawRecord>,
}

/// Fetch `count` random user records from the API
///
/// Performs exactly one `GET <base>/api/?results=<count>`. A network error
/// or non-success status is returned as an error; the caller decides how to
/// degrade.
pub async fn fetch_random_users(
    client: &reqwest::Client,
    base_url: &str,
    count: u32,
) -> Result<Vec<RawRecord>> {
    let url = format!("{}/api/?results={}", base_url.trim_end_matches('/'), count);

    let response = client.get(&url).send().await?;
    if !response.status().is_success() {
        return Err(EtlError::ApiStatus(response.status()));
    }

    let envelope: ApiEnvelope = response.json().await?;
    info!(
        requested = count,
        received = envelope.results.len(),
        "Fetched random users from API"
    );

    Ok(envelope.results)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_deserializes() {
        let body = r#"{"results": [{"gender": "female"}, {"gender": "male"}], "info": {"seed": "abc"}}"#;
        let envelope: ApiEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.results.len(), 2);
        assert_eq!(envelope.results[0]["gender"], "female");
    }

    #[test]
    fn test_envelope_requires_results() {
        let body = r#"{"info": {"seed": "abc"}}"#;
        assert!(serde_json::from_str::<ApiEnvelope>(body).is_err());
    }
}
