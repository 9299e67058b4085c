//! Generative advice API client.
//!
//! Thin client for the cloud text-generation endpoint. A failed call is
//! surfaced as `AdviceError::Unavailable` and never retried; callers treat
//! missing advice as a degraded state, not a fatal one.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::storage::config::AdviceSettings;

/// Cloud advice API client.
pub struct AdviceClient {
    /// HTTP client
    http: reqwest::Client,
    /// Base URL for API
    base_url: String,
    /// API key for authentication
    api_key: String,
}

impl AdviceClient {
    /// Create a client from endpoint settings and an API key.
    pub fn new(settings: &AdviceSettings, api_key: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(u64::from(settings.timeout_secs)))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            base_url: settings.base_url.clone(),
            api_key,
        }
    }

    /// Request advice text for the given prompt.
    pub async fn generate(&self, prompt: &str) -> Result<String, AdviceError> {
        let url = format!("{}/advice", self.base_url);

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&AdviceRequest { prompt })
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    AdviceError::Unavailable
                } else {
                    AdviceError::Api(e.to_string())
                }
            })?;

        let status = response.status();

        if status.is_success() {
            let api_response: ApiResponse<AdviceText> = response
                .json()
                .await
                .map_err(|e| AdviceError::Serialization(e.to_string()))?;

            if api_response.success {
                api_response
                    .data
                    .map(|advice| advice.text)
                    .ok_or_else(|| {
                        AdviceError::Api("API returned success but no data".to_string())
                    })
            } else {
                let error = api_response.error.unwrap_or_default();
                Err(AdviceError::Api(error.message))
            }
        } else if status.is_server_error() {
            Err(AdviceError::Unavailable)
        } else {
            Err(AdviceError::Api(format!("API returned status {status}")))
        }
    }
}

/// Advice request body.
#[derive(Debug, Serialize)]
struct AdviceRequest<'a> {
    prompt: &'a str,
}

/// Generated advice payload.
#[derive(Debug, Deserialize)]
struct AdviceText {
    text: String,
}

/// API response wrapper.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    error: Option<ApiError>,
}

/// API error details.
#[derive(Debug, Default, Deserialize)]
#[allow(dead_code)]
struct ApiError {
    code: String,
    message: String,
}

/// Advice errors.
#[derive(Debug, thiserror::Error)]
pub enum AdviceError {
    #[error("Advice service unreachable")]
    Unavailable,

    #[error("Advice API error: {0}")]
    Api(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = AdviceClient::new(&AdviceSettings::default(), "test-api-key".to_string());
        assert!(client.base_url.starts_with("https://"));
    }

    #[test]
    fn test_response_envelope_parsing() {
        let body = r#"{"success": true, "data": {"text": "Do squats."}, "error": null}"#;
        let parsed: ApiResponse<AdviceText> = serde_json::from_str(body).unwrap();
        assert!(parsed.success);
        assert_eq!(parsed.data.unwrap().text, "Do squats.");

        let body = r#"{"success": false, "data": null, "error": {"code": "quota", "message": "Quota exceeded"}}"#;
        let parsed: ApiResponse<AdviceText> = serde_json::from_str(body).unwrap();
        assert!(!parsed.success);
        assert_eq!(parsed.error.unwrap().message, "Quota exceeded");
    }
}
