//! Configuration loading, validation, and credential resolution for the
//! Edgee SDK.
//!
//! Loads configuration from `~/.edgee/config.toml` with environment
//! variable overrides. Validates all settings before a client is built.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "EDGEE_API_KEY";
/// Environment variable overriding the base URL.
pub const BASE_URL_ENV: &str = "EDGEE_BASE_URL";
/// Environment variable overriding the default model.
pub const MODEL_ENV: &str = "EDGEE_MODEL";

/// Default gateway endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.edgee.ai";

/// Chat-completions endpoint under `base_url` (scheme and host).
pub fn completions_url(base_url: &str) -> String {
    format!("{}/v1/chat/completions", base_url.trim_end_matches('/'))
}

/// Client configuration.
///
/// Maps directly to `~/.edgee/config.toml`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Bearer credential for the gateway
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Scheme and host of the gateway, without the API path
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used when the caller doesn't name one
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Iteration budget of the agentic loop
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Capacity of the per-request chunk and event channels
    #[serde(default = "default_stream_buffer")]
    pub stream_buffer: usize,

    /// TCP connect timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}
fn default_model() -> String {
    "devstral2".into()
}
fn default_max_iterations() -> u32 {
    10
}
fn default_stream_buffer() -> usize {
    10
}
fn default_connect_timeout_secs() -> u64 {
    30
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .field("max_iterations", &self.max_iterations)
            .field("stream_buffer", &self.stream_buffer)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

impl ClientConfig {
    /// Load configuration from the default path (~/.edgee/config.toml),
    /// then apply `EDGEE_API_KEY`, `EDGEE_BASE_URL` and `EDGEE_MODEL`.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path. A missing file yields
    /// the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup. Empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = var(API_KEY_ENV) {
            self.api_key = Some(key);
        }
        if let Some(url) = var(BASE_URL_ENV) {
            self.base_url = url;
        }
        if let Some(model) = var(MODEL_ENV) {
            self.default_model = model;
        }
    }

    /// Fill the API key and base URL from an environment lookup, but only
    /// where the configuration leaves them empty.
    pub fn fill_missing(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if !self.has_api_key() {
            if let Some(key) = var(API_KEY_ENV) {
                self.api_key = Some(key);
            }
        }
        if self.base_url.trim().is_empty() {
            self.base_url = var(BASE_URL_ENV).unwrap_or_else(default_base_url);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".edgee")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError("base_url must not be empty".into()));
        }

        if self.max_iterations == 0 {
            return Err(ConfigError::ValidationError("max_iterations must be > 0".into()));
        }

        if self.stream_buffer == 0 {
            return Err(ConfigError::ValidationError("stream_buffer must be > 0".into()));
        }

        Ok(())
    }

    /// The API key, or [`ConfigError::MissingApiKey`].
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }

    pub fn has_api_key(&self) -> bool {
        self.require_api_key().is_ok()
    }

    /// Full URL of the chat-completions endpoint.
    pub fn completions_url(&self) -> String {
        completions_url(&self.base_url)
    }

    pub fn connect_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.connect_timeout_secs)
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            default_model: default_model(),
            max_iterations: default_max_iterations(),
            stream_buffer: default_stream_buffer(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("EDGEE_API_KEY is not set")]
    MissingApiKey,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "https://api.edgee.ai");
        assert_eq!(config.default_model, "devstral2");
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.stream_buffer, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = ClientConfig {
            max_iterations: 4,
            ..ClientConfig::default()
        };
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: ClientConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_key = \"sk-file\"\nmax_iterations = 3").unwrap();

        let config = ClientConfig::load_from(file.path()).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-file"));
        assert_eq!(config.max_iterations, 3);
        assert_eq!(config.default_model, "devstral2");
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_iterations = \"many\"").unwrap();

        let err = ClientConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn zero_budget_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_iterations = 0").unwrap();

        let err = ClientConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = ClientConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = ClientConfig {
            api_key: Some("sk-file".into()),
            ..ClientConfig::default()
        };
        config.apply_env(env(&[
            ("EDGEE_API_KEY", "sk-env"),
            ("EDGEE_BASE_URL", "http://localhost:8080"),
            ("EDGEE_MODEL", ""),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.base_url, "http://localhost:8080");
        // empty override ignored
        assert_eq!(config.default_model, "devstral2");
    }

    #[test]
    fn missing_api_key_message() {
        let config = ClientConfig::default();
        let err = config.require_api_key().unwrap_err();
        assert_eq!(err.to_string(), "EDGEE_API_KEY is not set");
        assert!(!config.has_api_key());
    }

    #[test]
    fn fill_missing_keeps_explicit_values() {
        let env = |key: &str| match key {
            API_KEY_ENV => Some("env-key".to_string()),
            BASE_URL_ENV => Some("http://env:1".to_string()),
            _ => None,
        };

        let mut explicit = ClientConfig {
            api_key: Some("file-key".into()),
            ..ClientConfig::default()
        };
        explicit.fill_missing(env);
        assert_eq!(explicit.api_key.as_deref(), Some("file-key"));
        assert_eq!(explicit.base_url, DEFAULT_BASE_URL);

        let mut empty = ClientConfig {
            api_key: Some(String::new()),
            base_url: String::new(),
            ..ClientConfig::default()
        };
        empty.fill_missing(env);
        assert_eq!(empty.api_key.as_deref(), Some("env-key"));
        assert_eq!(empty.base_url, "http://env:1");

        let mut no_env = ClientConfig {
            base_url: String::new(),
            ..ClientConfig::default()
        };
        no_env.fill_missing(|_| None);
        assert_eq!(no_env.api_key, None);
        assert_eq!(no_env.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn completions_url_handles_trailing_slash() {
        let config = ClientConfig {
            base_url: "http://localhost:8080/".into(),
            ..ClientConfig::default()
        };
        assert_eq!(config.completions_url(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = ClientConfig {
            api_key: Some("sk-secret".into()),
            ..ClientConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
