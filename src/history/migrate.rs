use super::{HistoryStore, JsonStore, SqliteStore};

/// Outcome of copying JSON history into SQLite.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Entries read from the JSON file.
    pub total: usize,
    pub migrated: usize,
    /// `(entry id, error)` for every entry that could not be inserted.
    pub failures: Vec<(String, String)>,
}

impl MigrationReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Copy every entry of `source` into `target`. Entries that fail to insert
/// are skipped and recorded; existing rows with the same id are replaced.
///
/// # Errors
/// Returns an error only if `source` cannot be listed.
pub fn migrate(source: &JsonStore, target: &SqliteStore) -> anyhow::Result<MigrationReport> {
    let entries = source.list()?;
    let mut report = MigrationReport {
        total: entries.len(),
        ..MigrationReport::default()
    };
    for entry in &entries {
        match target.insert(entry) {
            Ok(()) => report.migrated += 1,
            Err(e) => {
                tracing::warn!("failed to migrate entry {}: {e:#}", entry.id);
                report.failures.push((entry.id.clone(), format!("{e:#}")));
            }
        }
    }
    Ok(report)
}
