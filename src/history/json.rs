use std::path::{Path, PathBuf};

use anyhow::Context as _;

use super::{HistoryEntry, HistoryStore};

/// History kept as one pretty-printed JSON array, newest entry first.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read every entry. A missing or unreadable file is an empty history.
    fn read_all(&self) -> Vec<HistoryEntry> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!("cannot read {}: {e}, treating history as empty", self.path.display());
                return Vec::new();
            }
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(
                "corrupt history file {}: {e}, treating history as empty",
                self.path.display()
            );
            Vec::new()
        })
    }

    fn write_all(&self, entries: &[HistoryEntry]) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create history dir {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(entries).context("serialize history")?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("write history file {}", self.path.display()))
    }
}

impl HistoryStore for JsonStore {
    fn insert(&self, entry: &HistoryEntry) -> anyhow::Result<()> {
        let mut entries = self.read_all();
        entries.retain(|e| e.id != entry.id);
        entries.insert(0, entry.clone());
        self.write_all(&entries)
    }

    fn list(&self) -> anyhow::Result<Vec<HistoryEntry>> {
        Ok(self.read_all())
    }

    fn get(&self, id: &str) -> anyhow::Result<Option<HistoryEntry>> {
        Ok(self.read_all().into_iter().find(|e| e.id == id))
    }

    fn delete(&self, id: &str) -> anyhow::Result<bool> {
        let mut entries = self.read_all();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return Ok(false);
        }
        self.write_all(&entries)?;
        Ok(true)
    }
}
