//! # Scribe Configuration
//!
//! Built once at process start: optional `.scribe/config.json`, then CLI
//! overrides, then credential resolution. A missing credential is a startup
//! failure; nothing is constructed without one.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::models::{ApiKey, BackendKind, GenerationOptions, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT_SECS};

/// Default location of the persisted configuration
pub const CONFIG_PATH: &str = ".scribe/config.json";

/// Persisted configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScribeConfig {
    /// Backend family to use
    pub backend: BackendKind,
    /// Model override (default depends on the backend)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Sampling temperature in [0, 1]
    pub temperature: f32,
    /// Per-call timeout
    pub timeout_secs: u64,
    /// Endpoint override for HTTP backends
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for ScribeConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            model: None,
            temperature: DEFAULT_TEMPERATURE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            base_url: None,
        }
    }
}

/// Values supplied on the command line; `None` keeps the loaded value
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub backend: Option<BackendKind>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub timeout_secs: Option<u64>,
    pub base_url: Option<String>,
}

/// Configuration with its credential, ready to build a backend
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub backend: BackendKind,
    pub options: GenerationOptions,
}

impl ScribeConfig {
    /// Create a config for a specific backend
    pub fn with_backend(backend: BackendKind) -> Self {
        Self {
            backend,
            ..Self::default()
        }
    }

    /// Set the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Load from [`CONFIG_PATH`]; defaults when the file does not exist
    pub async fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(CONFIG_PATH)).await
    }

    /// Load from `path`; defaults when the file does not exist
    pub async fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidConfigFile {
            path: PathBuf::from(path),
            reason,
        };

        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(invalid(e.to_string())),
        };

        serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))
    }

    /// Apply command-line overrides
    pub fn merge(&mut self, overrides: ConfigOverrides) {
        if let Some(backend) = overrides.backend {
            // A model chosen for another backend rarely makes sense here
            if backend != self.backend && overrides.model.is_none() {
                self.model = None;
            }
            self.backend = backend;
        }
        if overrides.model.is_some() {
            self.model = overrides.model;
        }
        if let Some(temperature) = overrides.temperature {
            self.temperature = temperature;
        }
        if let Some(timeout_secs) = overrides.timeout_secs {
            self.timeout_secs = timeout_secs;
        }
        if overrides.base_url.is_some() {
            self.base_url = overrides.base_url;
        }
    }

    /// Model that will be used
    pub fn effective_model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.backend.default_model())
    }

    /// Resolve against the process environment
    pub fn resolve(&self) -> Result<ResolvedConfig, ConfigError> {
        self.resolve_with(|var| std::env::var(var).ok())
    }

    /// Resolve with an explicit environment lookup
    pub fn resolve_with<F>(&self, lookup: F) -> Result<ResolvedConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = self.backend.credential_var();
        let key = lookup(var)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingCredential { var })?;

        let mut options = GenerationOptions::new(self.effective_model(), ApiKey::new(key))
            .with_temperature(self.temperature)?
            .with_timeout(Duration::from_secs(self.timeout_secs.max(1)));
        if let Some(url) = &self.base_url {
            options = options.with_base_url(url);
        }

        Ok(ResolvedConfig {
            backend: self.backend,
            options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ScribeConfig::default();
        assert_eq!(config.backend, BackendKind::Gemini);
        assert_eq!(config.temperature, 0.3);
        assert_eq!(config.effective_model(), "gemini-2.0-flash");
    }

    #[test]
    fn test_missing_credential_is_fatal() {
        let config = ScribeConfig::with_backend(BackendKind::OpenAI);
        let err = config
            .resolve_with(env(&[("GOOGLE_API_KEY", "g")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingCredential {
                var: "OPENAI_API_KEY"
            }
        ));

        let err = config
            .resolve_with(env(&[("OPENAI_API_KEY", "   ")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential { .. }));
    }

    #[test]
    fn test_resolve_builds_options() {
        let config = ScribeConfig::with_backend(BackendKind::OpenAI);
        let resolved = config
            .resolve_with(env(&[("OPENAI_API_KEY", "sk-1\n")]))
            .unwrap();
        assert_eq!(resolved.backend, BackendKind::OpenAI);
        assert_eq!(resolved.options.model, "gpt-4o-mini");
        assert_eq!(resolved.options.api_key.expose(), "sk-1");
        assert_eq!(resolved.options.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_invalid_temperature_is_rejected() {
        let mut config = ScribeConfig::default();
        config.temperature = 2.0;
        let err = config
            .resolve_with(env(&[("GOOGLE_API_KEY", "g")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTemperature(_)));
    }

    #[test]
    fn test_merge_overrides() {
        let mut config = ScribeConfig::default().with_model("gemini-1.5-pro");
        config.merge(ConfigOverrides {
            backend: Some(BackendKind::OpenAI),
            temperature: Some(0.7),
            ..Default::default()
        });
        assert_eq!(config.backend, BackendKind::OpenAI);
        // Model from the previous backend is dropped
        assert_eq!(config.effective_model(), "gpt-4o-mini");
        assert_eq!(config.temperature, 0.7);

        config.merge(ConfigOverrides {
            model: Some("gpt-4o".into()),
            ..Default::default()
        });
        assert_eq!(config.effective_model(), "gpt-4o");
    }

    #[test]
    fn test_base_url_reaches_every_backend() {
        for backend in BackendKind::all() {
            let mut config = ScribeConfig::with_backend(backend);
            config.base_url = Some("http://localhost:1234".into());
            let resolved = config
                .resolve_with(env(&[("GOOGLE_API_KEY", "g"), ("OPENAI_API_KEY", "o")]))
                .unwrap();
            assert_eq!(resolved.options.endpoint(backend), "http://localhost:1234");
        }
    }

    #[tokio::test]
    async fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ScribeConfig::load_from(&dir.path().join("config.json"))
            .await
            .unwrap();
        assert_eq!(config, ScribeConfig::default());
    }

    #[tokio::test]
    async fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"backend": "gemini-compat", "timeout_secs": 30}"#).unwrap();

        let config = ScribeConfig::load_from(&path).await.unwrap();
        assert_eq!(config.backend, BackendKind::GeminiCompat);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.temperature, DEFAULT_TEMPERATURE);
    }

    #[tokio::test]
    async fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"backend": "crew"}"#).unwrap();

        let err = ScribeConfig::load_from(&path).await.unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfigFile { .. }));
    }
}
