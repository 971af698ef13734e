use std::path::Path;

use anyhow::Context as _;

use promptgrade::config::Config;
use promptgrade::history::{self, HistoryEntry, HistoryStore};
use promptgrade::paths::HistoryPaths;
use promptgrade::render;

/// Open the configured history backend.
pub fn store_for(config: &Config) -> anyhow::Result<Box<dyn HistoryStore>> {
    let paths = HistoryPaths::resolve(config.storage.data_dir.as_deref())
        .context("cannot determine history directory")?;
    history::open_store(config.storage.backend, &paths)
}

fn open_history_store(config: &Config) -> Option<Box<dyn HistoryStore>> {
    match store_for(config) {
        Ok(store) => Some(store),
        Err(e) => {
            eprintln!("[promptgrade] error opening history: {e:#}");
            None
        }
    }
}

fn find_entry(store: &dyn HistoryStore, id: &str) -> Option<HistoryEntry> {
    match store.get(id) {
        Ok(Some(e)) => Some(e),
        Ok(None) => {
            eprintln!("[promptgrade] history entry {id} not found");
            None
        }
        Err(e) => {
            eprintln!("[promptgrade] error getting history entry: {e:#}");
            None
        }
    }
}

pub fn cmd_history_list(config: &Config, limit: usize) -> i32 {
    let Some(store) = open_history_store(config) else {
        return 1;
    };
    let entries = match store.list() {
        Ok(e) => e,
        Err(e) => {
            eprintln!("[promptgrade] error listing history: {e:#}");
            return 1;
        }
    };

    if entries.is_empty() {
        eprintln!("[promptgrade] no history entries found");
        return 0;
    }

    for entry in entries.iter().take(limit) {
        println!("{}", render::format_entry_line(entry));
    }
    0
}

pub fn cmd_history_show(config: &Config, id: &str, json: bool, raw: bool) -> i32 {
    let Some(store) = open_history_store(config) else {
        return 1;
    };
    let Some(entry) = find_entry(store.as_ref(), id) else {
        return 1;
    };

    if json {
        match serde_json::to_string_pretty(&entry) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("[promptgrade] JSON serialization error: {e}");
                return 1;
            }
        }
    } else {
        print!("{}", render::format_entry(&entry, raw));
    }
    0
}

pub fn cmd_history_export(config: &Config, id: &str, output: Option<&Path>) -> i32 {
    let Some(store) = open_history_store(config) else {
        return 1;
    };
    let Some(entry) = find_entry(store.as_ref(), id) else {
        return 1;
    };
    let content = match serde_json::to_string_pretty(&entry) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("[promptgrade] JSON serialization error: {e}");
            return 1;
        }
    };

    let Some(path) = output else {
        println!("{content}");
        return 0;
    };
    if let Err(e) = std::fs::write(path, format!("{content}\n")) {
        eprintln!("[promptgrade] error writing {}: {e}", path.display());
        return 1;
    }
    eprintln!("[promptgrade] exported {id} to {}", path.display());
    0
}

pub fn cmd_history_delete(config: &Config, id: &str) -> i32 {
    let Some(store) = open_history_store(config) else {
        return 1;
    };
    match store.delete(id) {
        Ok(true) => {
            eprintln!("[promptgrade] deleted {id}");
            0
        }
        Ok(false) => {
            eprintln!("[promptgrade] history entry {id} not found");
            1
        }
        Err(e) => {
            eprintln!("[promptgrade] error deleting history entry: {e:#}");
            1
        }
    }
}
