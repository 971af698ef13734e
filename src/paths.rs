//! Centralised promptgrade user-directory resolution.
//!
//! When `PROMPTGRADE_HOME` is set, it replaces **all** platform-native user
//! directories (config and data).
//!
//! Priority for the config directory:
//!   1. `PROMPTGRADE_HOME` env var (if set and non-empty)
//!   2. `dirs::config_dir().map(|d| d.join("promptgrade"))`
//!
//! Priority for the data directory (history files):
//!   1. `PROMPTGRADE_HOME`
//!   2. `dirs::data_local_dir().map(|d| d.join("promptgrade"))`

use std::path::{Path, PathBuf};

const APP_DIR: &str = "promptgrade";
const JSON_HISTORY_FILE: &str = "history.json";
const SQLITE_HISTORY_FILE: &str = "history.db";

/// Return the `PROMPTGRADE_HOME` path when set and non-empty, otherwise fall
/// through to the platform-native `dirs_fallback`.
fn resolve_user_path(dirs_fallback: Option<PathBuf>) -> Option<PathBuf> {
    if let Ok(home) = std::env::var("PROMPTGRADE_HOME")
        && !home.is_empty()
    {
        return Some(PathBuf::from(home));
    }
    dirs_fallback
}

/// Directory holding `config.toml`.
pub fn user_dir() -> Option<PathBuf> {
    resolve_user_path(dirs::config_dir().map(|d| d.join(APP_DIR)))
}

/// Directory holding the history files.
pub fn user_data_dir() -> Option<PathBuf> {
    resolve_user_path(dirs::data_local_dir().map(|d| d.join(APP_DIR)))
}

/// Locations of both history backends under one data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryPaths {
    pub json: PathBuf,
    pub sqlite: PathBuf,
}

impl HistoryPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            json: dir.join(JSON_HISTORY_FILE),
            sqlite: dir.join(SQLITE_HISTORY_FILE),
        }
    }

    /// Resolve history paths, preferring an explicit `data_dir` from config.
    pub fn resolve(data_dir: Option<&Path>) -> Option<Self> {
        data_dir
            .map(Path::to_path_buf)
            .or_else(user_data_dir)
            .map(|d| Self::in_dir(&d))
    }
}
