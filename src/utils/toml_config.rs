//! TOML-based configuration for Scribe
//!
//! Configuration lives in `scribe.toml`. Every field has a default, so an
//! empty (or missing) file yields a working local setup that runs on
//! fallback generation if no Ollama server is reachable.
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 3000
//! log_format = "pretty"
//!
//! [llm]
//! provider = "ollama"
//! base_url = "http://localhost:11434"
//! model = "llama3.2"
//!
//! [tasks]
//! retention_secs = 86400
//! max_tasks = 10000
//! ```
//!
//! A handful of environment variables override the file (see
//! [`ScribeConfig::apply_env_overrides`]).

use crate::llm::Provider;
use crate::tasks::RetentionPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Upper bound for every `*_secs` setting: one year.
pub const MAX_DURATION_SECS: u64 = 365 * 24 * 60 * 60;

/// Root configuration structure loaded from scribe.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScribeConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub memory: MemoryConfig,

    #[serde(default)]
    pub sessions: SessionConfig,

    #[serde(default)]
    pub tasks: TaskConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// How long shutdown waits for in-flight tasks before aborting them
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_shutdown_grace_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

// ============= LLM Configuration =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Ollama,
    /// Never call a model; every stage uses its fallback text
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: ProviderKind,

    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Per-call generation timeout
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_llm_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_llm_model() -> String {
    "llama3.2".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

impl LlmConfig {
    /// The provider to build a live client from, if any.
    pub fn provider(&self) -> Option<Provider> {
        match self.provider {
            ProviderKind::Ollama => Some(Provider::Ollama {
                base_url: self.base_url.clone(),
                model: self.model.clone(),
            }),
            ProviderKind::None => None,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ============= Memory, Sessions, Tasks =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_ttl_secs() -> u64 {
    3600
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_ttl_secs")]
    pub max_age_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_age_secs: default_ttl_secs(),
        }
    }
}

/// Task retention. Both limits are off by default: records are kept until
/// the process exits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tasks: Option<usize>,
}

impl TaskConfig {
    pub fn retention_policy(&self) -> RetentionPolicy {
        RetentionPolicy {
            retention: self.retention_secs.map(Duration::from_secs),
            max_tasks: self.max_tasks,
        }
    }
}

// ============= Tool Configuration =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_max_results() -> usize {
    5
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    #[serde(default = "default_executor_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_interpreter() -> String {
    "python3".to_string()
}

fn default_executor_timeout_secs() -> u64 {
    30
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            timeout_secs: default_executor_timeout_secs(),
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize configuration: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' has an invalid value: {1}")]
    InvalidEnvVar(String, String),
}

impl From<ConfigError> for crate::types::AppError {
    fn from(err: ConfigError) -> Self {
        crate::types::AppError::Configuration(err.to_string())
    }
}

impl ScribeConfig {
    /// Load configuration from a TOML file, apply environment overrides and
    /// validate the result.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let mut config = Self::from_toml(&content)?;
        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file means "all defaults".
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match Self::load(&path) {
            Err(ConfigError::FileNotFound(path)) => {
                tracing::info!(path = %path.display(), "No configuration file, using defaults");
                let mut config = Self::default();
                config.apply_env_overrides()?;
                config.validate()?;
                Ok(config)
            }
            other => other,
        }
    }

    /// Parse TOML without touching the environment or validating.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Apply `SCRIBE_HOST`, `SCRIBE_PORT`, `SCRIBE_LLM_MODEL` and
    /// `SCRIBE_LLM_BASE_URL` when set.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary lookup. Split out so tests need not
    /// mutate the process environment.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SCRIBE_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SCRIBE_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidEnvVar("SCRIBE_PORT".to_string(), port))?;
        }
        if let Some(model) = lookup("SCRIBE_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(base_url) = lookup("SCRIBE_LLM_BASE_URL") {
            self.llm.base_url = base_url;
        }
        Ok(())
    }

    /// Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server.port must be non-zero".to_string(),
            ));
        }

        if self.llm.provider != ProviderKind::None {
            if self.llm.model.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "llm.model must be set when a provider is configured".to_string(),
                ));
            }
            if self.llm.base_url.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "llm.base_url must be set when a provider is configured".to_string(),
                ));
            }
        }

        for (name, value) in [
            ("llm.timeout_secs", self.llm.timeout_secs),
            ("memory.ttl_secs", self.memory.ttl_secs),
            ("sessions.max_age_secs", self.sessions.max_age_secs),
            ("executor.timeout_secs", self.executor.timeout_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be greater than zero",
                    name
                )));
            }
            if value > MAX_DURATION_SECS {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be at most {} seconds",
                    name, MAX_DURATION_SECS
                )));
            }
        }

        if self.search.max_results == 0 {
            return Err(ConfigError::ValidationError(
                "search.max_results must be greater than zero".to_string(),
            ));
        }

        if self.tasks.retention_secs.is_some_and(|secs| secs > MAX_DURATION_SECS) {
            return Err(ConfigError::ValidationError(format!(
                "tasks.retention_secs must be at most {} seconds",
                MAX_DURATION_SECS
            )));
        }

        if self.tasks.max_tasks == Some(0) {
            return Err(ConfigError::ValidationError(
                "tasks.max_tasks must be greater than zero when set".to_string(),
            ));
        }

        if self.executor.interpreter.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "executor.interpreter must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_all_defaults() {
        let config = ScribeConfig::from_toml("").unwrap();
        assert_eq!(config, ScribeConfig::default());
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.llm.provider, ProviderKind::Ollama);
        assert_eq!(config.memory.ttl_secs, 3600);
        assert_eq!(config.search.max_results, 5);
        assert_eq!(config.executor.interpreter, "python3");
        assert!(config.tasks.retention_policy().retention.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_sections() {
        let config = ScribeConfig::from_toml(
            r#"
            [server]
            port = 8080
            log_format = "json"

            [llm]
            provider = "none"

            [tasks]
            max_tasks = 100
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.log_format, LogFormat::Json);
        assert!(config.llm.provider().is_none());
        assert_eq!(config.tasks.retention_policy().max_tasks, Some(100));
    }

    #[test]
    fn test_overrides() {
        let mut config = ScribeConfig::default();
        config
            .apply_overrides(|name| match name {
                "SCRIBE_PORT" => Some("9000".to_string()),
                "SCRIBE_LLM_MODEL" => Some("mistral".to_string()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.llm.model, "mistral");
        assert_eq!(config.llm.provider().unwrap().model(), "mistral");
    }

    #[test]
    fn test_bad_port_override() {
        let mut config = ScribeConfig::default();
        let err = config
            .apply_overrides(|name| (name == "SCRIBE_PORT").then(|| "http".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_validation_failures() {
        let mut config = ScribeConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = ScribeConfig::default();
        config.llm.model = "  ".to_string();
        assert!(config.validate().is_err());
        config.llm.provider = ProviderKind::None;
        assert!(config.validate().is_ok());

        let mut config = ScribeConfig::default();
        config.search.max_results = 0;
        assert!(config.validate().is_err());

        let mut config = ScribeConfig::default();
        config.executor.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_durations_are_capped() {
        let mut config = ScribeConfig::default();
        config.memory.ttl_secs = MAX_DURATION_SECS;
        assert!(config.validate().is_ok());

        config.memory.ttl_secs = u64::MAX;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));

        let mut config = ScribeConfig::default();
        config.llm.timeout_secs = u64::MAX;
        assert!(config.validate().is_err());

        let mut config = ScribeConfig::default();
        config.tasks.retention_secs = Some(u64::MAX);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_round_trips_through_toml() {
        let mut config = ScribeConfig::default();
        config.tasks.retention_secs = Some(60);
        let text = config.to_toml().unwrap();
        assert_eq!(ScribeConfig::from_toml(&text).unwrap(), config);
    }
}
