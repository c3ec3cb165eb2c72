//! # Scribe Models
//!
//! Backend families and the per-call generation options shared by every
//! agent. Options are built once at startup (see [`crate::config`]) and
//! handed to each backend by reference.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Default sampling temperature used by every stage
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Default per-call timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const GEMINI_COMPAT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Supported generation backends
///
/// Each family talks to its provider differently but all of them satisfy
/// the same [`crate::backends::Backend`] contract:
/// - `gemini` - Gemini `generateContent`, instruction inlined into the prompt
/// - `gemini-chat` - Gemini `generateContent` with a separate system instruction
/// - `openai` - OpenAI chat completions
/// - `gemini-compat` - Gemini's OpenAI-compatible endpoint, reply extracted from the message object
/// - `radkit` - radkit `LlmFunction` producing a structured task report
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    #[default]
    Gemini,
    GeminiChat,
    #[serde(rename = "openai")]
    OpenAI,
    GeminiCompat,
    Radkit,
}

impl BackendKind {
    /// Get all available backends
    pub fn all() -> Vec<BackendKind> {
        vec![
            BackendKind::Gemini,
            BackendKind::GeminiChat,
            BackendKind::OpenAI,
            BackendKind::GeminiCompat,
            BackendKind::Radkit,
        ]
    }

    /// Stable identifier used in config files, CLI flags and the API
    pub fn id(&self) -> &'static str {
        match self {
            BackendKind::Gemini => "gemini",
            BackendKind::GeminiChat => "gemini-chat",
            BackendKind::OpenAI => "openai",
            BackendKind::GeminiCompat => "gemini-compat",
            BackendKind::Radkit => "radkit",
        }
    }

    /// Display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            BackendKind::Gemini => "Google AI (direct)",
            BackendKind::GeminiChat => "Google AI (system instruction)",
            BackendKind::OpenAI => "OpenAI",
            BackendKind::GeminiCompat => "Google AI (OpenAI-compatible)",
            BackendKind::Radkit => "Radkit agent",
        }
    }

    /// Environment variable holding this backend's credential
    pub fn credential_var(&self) -> &'static str {
        match self {
            BackendKind::OpenAI => "OPENAI_API_KEY",
            _ => "GOOGLE_API_KEY",
        }
    }

    /// Model used when the configuration does not name one
    pub fn default_model(&self) -> &'static str {
        match self {
            BackendKind::OpenAI => "gpt-4o-mini",
            _ => "gemini-2.0-flash",
        }
    }

    /// Provider endpoint used when no base URL override is configured
    pub fn default_base_url(&self) -> &'static str {
        match self {
            BackendKind::Gemini | BackendKind::GeminiChat | BackendKind::Radkit => GEMINI_BASE_URL,
            BackendKind::OpenAI => OPENAI_BASE_URL,
            BackendKind::GeminiCompat => GEMINI_COMPAT_BASE_URL,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        BackendKind::all()
            .into_iter()
            .find(|kind| kind.id() == wanted)
            .ok_or_else(|| ConfigError::UnknownBackend(s.to_string()))
    }
}

/// A provider credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw secret, for request headers only
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Options applied to every generation call
///
/// ## Example
/// ```rust,ignore
/// use scribe_core::models::{ApiKey, GenerationOptions};
///
/// let options = GenerationOptions::new("gemini-2.0-flash", ApiKey::new(key))
///     .with_temperature(0.3)?;
/// ```
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    /// Model identifier (e.g., "gemini-2.0-flash", "gpt-4o-mini")
    pub model: String,
    /// Sampling temperature in [0, 1]
    pub temperature: f32,
    /// Provider credential
    pub api_key: ApiKey,
    /// Upper bound for a single backend call
    pub timeout: Duration,
    /// Optional endpoint override (mock servers, compatible gateways)
    pub base_url: Option<String>,
}

impl GenerationOptions {
    pub fn new(model: impl Into<String>, api_key: ApiKey) -> Self {
        Self {
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            api_key,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            base_url: None,
        }
    }

    /// Set the temperature, rejecting values outside [0, 1]
    pub fn with_temperature(mut self, temperature: f32) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&temperature) {
            return Err(ConfigError::InvalidTemperature(temperature));
        }
        self.temperature = temperature;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Endpoint to call for `kind`: explicit override, else the provider default
    pub fn endpoint(&self, kind: BackendKind) -> String {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| kind.default_base_url())
            .trim_end_matches('/')
            .to_string()
    }
}
