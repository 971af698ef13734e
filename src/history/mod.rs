pub mod json;
pub mod migrate;
pub mod sqlite;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use json::JsonStore;
pub use migrate::{MigrationReport, migrate};
pub use sqlite::SqliteStore;

use crate::grade::GradeResult;
use crate::paths::HistoryPaths;

/// One persisted grading session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    /// UTC, `YYYY-MM-DDTHH:MM:SS.ffffffZ`; sorts lexicographically.
    pub timestamp: String,
    pub prompt: String,
    pub model: String,
    pub temperature: f64,
    pub result: GradeResult,
}

/// Current UTC time in the entry timestamp format.
pub fn now_timestamp() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.6fZ")
        .to_string()
}

impl HistoryEntry {
    /// Pure constructor apart from the clock and the random id.
    pub fn new(prompt: &str, model: &str, temperature: f64, result: GradeResult) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: now_timestamp(),
            prompt: prompt.to_owned(),
            model: model.to_owned(),
            temperature,
            result,
        }
    }
}

/// Persistence for past grading results.
///
/// Implementations rewrite their whole backing store per call and take no
/// locks; concurrent writers in separate processes can lose updates.
pub trait HistoryStore {
    /// Store `entry`, replacing any entry with the same id.
    ///
    /// # Errors
    /// Returns an error if the backing store cannot be written.
    fn insert(&self, entry: &HistoryEntry) -> anyhow::Result<()>;

    /// All entries, newest first.
    ///
    /// # Errors
    /// Returns an error if the backing store cannot be queried.
    fn list(&self) -> anyhow::Result<Vec<HistoryEntry>>;

    /// # Errors
    /// Returns an error if the backing store cannot be queried.
    fn get(&self, id: &str) -> anyhow::Result<Option<HistoryEntry>>;

    /// Remove the entry with `id`. `Ok(false)` when there was none.
    ///
    /// # Errors
    /// Returns an error if the backing store cannot be written.
    fn delete(&self, id: &str) -> anyhow::Result<bool>;

    /// Wrap a result in a fresh entry and store it.
    ///
    /// # Errors
    /// Returns an error if the backing store cannot be written.
    fn save(
        &self,
        prompt: &str,
        model: &str,
        temperature: f64,
        result: GradeResult,
    ) -> anyhow::Result<HistoryEntry> {
        let entry = HistoryEntry::new(prompt, model, temperature, result);
        self.insert(&entry)?;
        Ok(entry)
    }
}

/// Which store the CLI reads and writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HistoryBackend {
    #[default]
    Json,
    Sqlite,
}

impl fmt::Display for HistoryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Sqlite => "sqlite",
        })
    }
}

impl FromStr for HistoryBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "sqlite" | "sql" => Ok(Self::Sqlite),
            other => Err(format!("unknown history backend {other:?} (expected json or sqlite)")),
        }
    }
}

/// Open the store for `backend` at its path under `paths`.
///
/// # Errors
/// Returns an error if the SQLite database cannot be opened or initialised.
pub fn open_store(
    backend: HistoryBackend,
    paths: &HistoryPaths,
) -> anyhow::Result<Box<dyn HistoryStore>> {
    Ok(match backend {
        HistoryBackend::Json => Box::new(JsonStore::new(&paths.json)),
        HistoryBackend::Sqlite => Box::new(SqliteStore::open(&paths.sqlite)?),
    })
}
