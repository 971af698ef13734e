use std::path::Path;

use anyhow::Context as _;
use rusqlite::Connection;

use super::{HistoryEntry, HistoryStore};
use crate::grade::GradeResult;

const SELECT_COLUMNS: &str = "SELECT id, timestamp, prompt, model, temperature, result_json FROM history";

/// History kept in a single SQLite table keyed by entry id.
pub struct SqliteStore {
    conn: Connection,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("path", &self.conn.path())
            .finish()
    }
}

impl SqliteStore {
    /// Open or create the DB at `path` and ensure the history table exists.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created, the DB cannot be
    /// opened, or the schema cannot be created.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create db dir {}", parent.display()))?;
        }
        let conn =
            Connection::open(path).with_context(|| format!("open db at {}", path.display()))?;
        Self::from_connection(conn)
    }

    /// Wrap an existing connection, initialising the schema on it.
    ///
    /// # Errors
    /// Returns an error if the table creation fails.
    pub fn from_connection(conn: Connection) -> anyhow::Result<Self> {
        init_history_table(&conn)?;
        Ok(Self { conn })
    }

    pub const fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Create the history table if it does not exist yet.
///
/// # Errors
/// Returns an error if the table creation fails.
pub fn init_history_table(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS history (
            id          TEXT PRIMARY KEY,
            timestamp   TEXT,
            prompt      TEXT,
            model       TEXT,
            temperature REAL,
            result_json TEXT
        );",
    )
    .context("create history table")?;
    Ok(())
}

fn parse_result(json: Option<String>) -> rusqlite::Result<GradeResult> {
    match json.filter(|j| !j.trim().is_empty()) {
        None => Ok(GradeResult::default()),
        Some(j) => serde_json::from_str(&j).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        }),
    }
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<HistoryEntry> {
    Ok(HistoryEntry {
        id: row.get(0)?,
        timestamp: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        prompt: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        model: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        temperature: row.get::<_, Option<f64>>(4)?.unwrap_or_default(),
        result: parse_result(row.get(5)?)?,
    })
}

impl HistoryStore for SqliteStore {
    fn insert(&self, entry: &HistoryEntry) -> anyhow::Result<()> {
        let result_json = serde_json::to_string(&entry.result).context("serialize result")?;
        self.conn
            .execute(
                "INSERT OR REPLACE INTO history
                    (id, timestamp, prompt, model, temperature, result_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    entry.id,
                    entry.timestamp,
                    entry.prompt,
                    entry.model,
                    entry.temperature,
                    result_json
                ],
            )
            .with_context(|| format!("insert history entry {}", entry.id))?;
        Ok(())
    }

    fn list(&self) -> anyhow::Result<Vec<HistoryEntry>> {
        // rowid breaks timestamp ties; a replaced row gets a fresh rowid.
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_COLUMNS} ORDER BY timestamp DESC, rowid DESC"))?;
        let mut rows = stmt.query([])?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            match map_row(row) {
                Ok(entry) => result.push(entry),
                Err(e) => {
                    let id = row
                        .get::<_, Option<String>>(0)
                        .ok()
                        .flatten()
                        .unwrap_or_default();
                    tracing::warn!("skipping unreadable history row {id}: {e}");
                }
            }
        }
        Ok(result)
    }

    fn get(&self, id: &str) -> anyhow::Result<Option<HistoryEntry>> {
        let mut stmt = self.conn.prepare(&format!("{SELECT_COLUMNS} WHERE id = ?1"))?;
        let mut rows = stmt.query([id])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        match map_row(row) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                tracing::warn!("unreadable history row {id}: {e}");
                Ok(None)
            }
        }
    }

    fn delete(&self, id: &str) -> anyhow::Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM history WHERE id = ?1", [id])
            .with_context(|| format!("delete history entry {id}"))?;
        Ok(removed > 0)
    }
}
