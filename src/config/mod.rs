use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::history::HistoryBackend;

pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_MAX_TOKENS: u32 = 500;

const CONFIG_FILE: &str = "config.toml";

/// Private: parsed representation of `config.toml`.
#[derive(serde::Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    grader: Option<GraderSection>,
    storage: Option<StorageSection>,
}

#[derive(serde::Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct GraderSection {
    model: Option<String>,
    temperature: Option<f64>,
    api_base: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
    max_tokens: Option<u32>,
}

#[derive(serde::Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct StorageSection {
    backend: Option<String>,
    data_dir: Option<PathBuf>,
}

/// Settings for the external grader.
#[derive(Clone, PartialEq)]
pub struct GraderSettings {
    pub model: String,
    pub temperature: f64,
    pub api_base: String,
    /// Configured credential. A key supplied per call takes precedence.
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub max_tokens: u32,
}

impl Default for GraderSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_owned(),
            temperature: 0.0,
            api_base: DEFAULT_API_BASE.to_owned(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

// Custom Debug masks the key so settings are safe to log.
impl std::fmt::Debug for GraderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraderSettings")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageSettings {
    pub backend: HistoryBackend,
    /// Overrides the platform data directory when set.
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub grader: GraderSettings,
    pub storage: StorageSettings,
}

/// Read and parse a config file. `Ok(None)` when the file does not exist.
fn read_config_file(path: &Path) -> anyhow::Result<Option<ConfigFile>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context(format!("failed to read config file: {}", path.display())));
        }
    };
    let file: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;
    Ok(Some(file))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parse a backend name the same way the CLI does, keeping `fallback` on error.
fn parse_backend(source: &str, raw: &str, fallback: HistoryBackend) -> HistoryBackend {
    raw.parse().unwrap_or_else(|e| {
        tracing::warn!("{source}: {e}, keeping {fallback}");
        fallback
    })
}

fn checked_temperature(value: f64, fallback: f64) -> f64 {
    if (0.0..=1.0).contains(&value) {
        value
    } else {
        tracing::warn!("grader.temperature {value} is outside 0.0..=1.0, using {fallback}");
        fallback
    }
}

impl Config {
    /// Path of the user-level config file, if a config directory exists.
    pub fn default_path() -> Option<PathBuf> {
        crate::paths::user_dir().map(|d| d.join(CONFIG_FILE))
    }

    /// Load configuration from the user config file and the process
    /// environment. Priority: environment → config file → defaults.
    pub fn load() -> Self {
        let path = Self::default_path();
        Self::load_with(path.as_deref(), |key| std::env::var(key).ok())
    }

    /// Load configuration from an explicit file and environment lookup.
    /// A file that cannot be read or parsed is reported and ignored.
    pub fn load_with(path: Option<&Path>, env: impl Fn(&str) -> Option<String>) -> Self {
        let file = match path.map(read_config_file).transpose() {
            Ok(file) => file.flatten().unwrap_or_default(),
            Err(e) => {
                tracing::warn!("ignoring config: {e:#}");
                ConfigFile::default()
            }
        };
        let mut config = Self::from_file(file);
        config.apply_env(env);
        config
    }

    fn from_file(file: ConfigFile) -> Self {
        let grader = file.grader.unwrap_or_default();
        let storage = file.storage.unwrap_or_default();
        let defaults = GraderSettings::default();
        Self {
            grader: GraderSettings {
                model: non_empty(grader.model).unwrap_or(defaults.model),
                temperature: grader
                    .temperature
                    .map_or(defaults.temperature, |t| checked_temperature(t, defaults.temperature)),
                api_base: non_empty(grader.api_base).unwrap_or(defaults.api_base),
                api_key: non_empty(grader.api_key),
                timeout_secs: grader.timeout_secs.unwrap_or(defaults.timeout_secs),
                max_tokens: grader.max_tokens.unwrap_or(defaults.max_tokens),
            },
            storage: StorageSettings {
                backend: non_empty(storage.backend).map_or_else(HistoryBackend::default, |raw| {
                    parse_backend("storage.backend", &raw, HistoryBackend::default())
                }),
                data_dir: storage.data_dir,
            },
        }
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(key) = non_empty(env("OPENAI_API_KEY")) {
            self.grader.api_key = Some(key);
        }
        if let Some(base) = non_empty(env("OPENAI_BASE_URL")) {
            self.grader.api_base = base;
        }
        if let Some(raw) = non_empty(env("PROMPTGRADE_BACKEND")) {
            self.storage.backend = parse_backend("PROMPTGRADE_BACKEND", &raw, self.storage.backend);
        }
    }
}

#[cfg(test)]
mod tests;
