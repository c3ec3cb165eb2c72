//! Shared HTTP plumbing: client construction and failure classification.

use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::{BackendError, ConfigError};

pub(crate) fn client() -> Result<reqwest::Client, ConfigError> {
    reqwest::Client::builder()
        .user_agent(concat!("scribe/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ConfigError::HttpClient(e.to_string()))
}

/// Map a request failure (no usable HTTP status) to a backend error
pub(crate) fn classify_request_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::Transport(format!("request timed out: {}", err))
    } else if err.is_decode() {
        BackendError::MalformedResponse(format!("failed to decode response body: {}", err))
    } else {
        BackendError::Transport(format!("request failed: {}", err))
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Map a non-success HTTP status (plus the provider's error body) to a
/// backend error. Both providers wrap failures as `{"error": {"message", ...}}`.
pub(crate) fn classify_status(status: StatusCode, body: &str) -> BackendError {
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error)
        .unwrap_or_default();
    let provider_status = detail.status.unwrap_or_default();
    let message = detail
        .message
        .unwrap_or_else(|| body.chars().take(200).collect());
    let message = format!("HTTP {}: {}", status.as_u16(), message);

    // Gemini reports a bad key as 400 INVALID_ARGUMENT
    let bad_key = message.contains("API key not valid") || message.contains("API_KEY_INVALID");

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::Authentication(message),
        StatusCode::TOO_MANY_REQUESTS => BackendError::RateLimit(message),
        _ if bad_key => BackendError::Authentication(message),
        _ if provider_status == "RESOURCE_EXHAUSTED" => BackendError::RateLimit(message),
        _ => BackendError::Transport(message),
    }
}
