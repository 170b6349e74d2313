//! Loading `scribe.toml` from disk.

use scribe::utils::toml_config::{ConfigError, LogFormat, ProviderKind, ScribeConfig};
use scribe::{AppError, WorkflowEngine};
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).expect("write config");
    file
}

#[test]
fn test_load_full_file() {
    let file = write_config(
        r#"
        [server]
        host = "0.0.0.0"
        port = 8088
        log_format = "json"
        shutdown_grace_secs = 5

        [llm]
        provider = "none"

        [memory]
        ttl_secs = 120

        [sessions]
        max_age_secs = 600

        [tasks]
        retention_secs = 86400
        max_tasks = 500

        [search]
        max_results = 3

        [executor]
        interpreter = "python3"
        timeout_secs = 10
        "#,
    );

    let config = ScribeConfig::load(file.path()).unwrap();
    assert_eq!(config.server.addr(), "0.0.0.0:8088");
    assert_eq!(config.server.log_format, LogFormat::Json);
    assert_eq!(config.server.shutdown_grace().as_secs(), 5);
    assert_eq!(config.llm.provider, ProviderKind::None);
    assert_eq!(config.memory.ttl_secs, 120);
    assert_eq!(config.sessions.max_age_secs, 600);
    assert_eq!(config.tasks.max_tasks, Some(500));
    assert_eq!(config.search.max_results, 3);
    assert_eq!(config.executor.timeout_secs, 10);
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("scribe.toml");

    let err = ScribeConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound(_)));

    let config = ScribeConfig::load_or_default(&path).unwrap();
    assert_eq!(config.server.port, 3000);
}

#[test]
fn test_malformed_toml_is_a_parse_error() {
    let file = write_config("[server\nport = 1");
    let err = ScribeConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));

    // load_or_default only forgives a missing file
    assert!(ScribeConfig::load_or_default(file.path()).is_err());
}

#[test]
fn test_invalid_values_fail_validation() {
    let file = write_config("[search]\nmax_results = 0\n");
    let err = ScribeConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError(_)));

    let app_err: AppError = err.into();
    assert!(matches!(app_err, AppError::Configuration(_)));
}

#[test]
fn test_written_config_loads_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("scribe.toml");

    let mut config = ScribeConfig::default();
    config.llm.provider = ProviderKind::None;
    config.tasks.retention_secs = Some(3600);
    std::fs::write(&path, config.to_toml().unwrap()).unwrap();

    assert_eq!(ScribeConfig::load(&path).unwrap(), config);
}

#[tokio::test]
async fn test_engine_from_loaded_config() {
    let file = write_config("[llm]\nprovider = \"none\"\n\n[search]\nmax_results = 2\n");
    let config = ScribeConfig::load(file.path()).unwrap();

    let engine = WorkflowEngine::from_config(config).await.unwrap();
    let task = engine
        .run_to_completion(scribe::TaskRequest::new("Rust"))
        .await
        .unwrap();

    let research = task.result.unwrap().research;
    assert_eq!(research.sources.len(), 2);
}
