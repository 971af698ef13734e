#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::fs;

use tempfile::TempDir;

use super::*;

fn no_env(_: &str) -> Option<String> {
    None
}

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, content).unwrap();
    path
}

// --- defaults ---

#[test]
fn missing_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let config = Config::load_with(Some(&dir.path().join("absent.toml")), no_env);
    assert_eq!(config, Config::default());
    assert_eq!(config.grader.model, "gpt-4");
    assert_eq!(config.grader.timeout_secs, 15);
    assert_eq!(config.grader.max_tokens, 500);
    assert_eq!(config.storage.backend, HistoryBackend::Json);
}

#[test]
fn no_path_yields_defaults() {
    assert_eq!(Config::load_with(None, no_env), Config::default());
}

// --- file parsing ---

#[test]
fn file_values_override_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[grader]
model = "gpt-4o"
temperature = 0.7
api_base = "http://localhost:9000/v1"
timeout_secs = 30

[storage]
backend = "sqlite"
data_dir = "/tmp/pg-data"
"#,
    );
    let config = Config::load_with(Some(&path), no_env);
    assert_eq!(config.grader.model, "gpt-4o");
    assert!((config.grader.temperature - 0.7).abs() < f64::EPSILON);
    assert_eq!(config.grader.api_base, "http://localhost:9000/v1");
    assert_eq!(config.grader.timeout_secs, 30);
    assert_eq!(config.grader.max_tokens, 500);
    assert_eq!(config.storage.backend, HistoryBackend::Sqlite);
    assert_eq!(config.storage.data_dir, Some(PathBuf::from("/tmp/pg-data")));
}

#[test]
fn invalid_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[grader\nmodel = ");
    assert_eq!(Config::load_with(Some(&path), no_env), Config::default());
}

#[test]
fn backend_spelling_matches_cli_parsing() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "[grader]\napi_key = \"sk-file\"\nmodel = \"gpt-4o\"\n\n[storage]\nbackend = \"SQLite\"\n",
    );
    let config = Config::load_with(Some(&path), no_env);
    assert_eq!(config.storage.backend, HistoryBackend::Sqlite);
    assert_eq!(config.grader.api_key.as_deref(), Some("sk-file"));
    assert_eq!(config.grader.model, "gpt-4o");
}

#[test]
fn unknown_backend_keeps_rest_of_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "[grader]\napi_key = \"sk-file\"\n\n[storage]\nbackend = \"postgres\"\n",
    );
    let config = Config::load_with(Some(&path), no_env);
    assert_eq!(config.storage.backend, HistoryBackend::Json);
    assert_eq!(config.grader.api_key.as_deref(), Some("sk-file"));
}

#[test]
fn out_of_range_temperature_uses_default() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[grader]\ntemperature = 7.5\nmodel = \"gpt-4o\"\n");
    let config = Config::load_with(Some(&path), no_env);
    assert!(config.grader.temperature.abs() < f64::EPSILON);
    assert_eq!(config.grader.model, "gpt-4o");
}

#[test]
fn boundary_temperature_is_kept() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[grader]\ntemperature = 1.0\n");
    let config = Config::load_with(Some(&path), no_env);
    assert!((config.grader.temperature - 1.0).abs() < f64::EPSILON);
}

#[test]
fn unknown_keys_are_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[grader]\nmodle = \"typo\"\n");
    assert!(read_config_file(&path).is_err());
}

#[test]
fn blank_api_key_in_file_is_ignored() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[grader]\napi_key = \"   \"\n");
    assert!(Config::load_with(Some(&path), no_env).grader.api_key.is_none());
}

// --- environment overlay ---

#[test]
fn env_key_overrides_file_key() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[grader]\napi_key = \"from-file\"\n");
    let config = Config::load_with(Some(&path), env_from(&[("OPENAI_API_KEY", "from-env")]));
    assert_eq!(config.grader.api_key.as_deref(), Some("from-env"));
}

#[test]
fn env_base_url_and_backend() {
    let config = Config::load_with(
        None,
        env_from(&[
            ("OPENAI_BASE_URL", "http://gateway/v1"),
            ("PROMPTGRADE_BACKEND", "sqlite"),
        ]),
    );
    assert_eq!(config.grader.api_base, "http://gateway/v1");
    assert_eq!(config.storage.backend, HistoryBackend::Sqlite);
}

#[test]
fn invalid_env_backend_is_ignored() {
    let config = Config::load_with(None, env_from(&[("PROMPTGRADE_BACKEND", "postgres")]));
    assert_eq!(config.storage.backend, HistoryBackend::Json);
}

// --- Debug ---

#[test]
fn debug_redacts_api_key() {
    let settings = GraderSettings {
        api_key: Some("sk-secret".to_owned()),
        ..GraderSettings::default()
    };
    let rendered = format!("{settings:?}");
    assert!(!rendered.contains("sk-secret"), "leaked key: {rendered}");
    assert!(rendered.contains("<redacted>"));
}
