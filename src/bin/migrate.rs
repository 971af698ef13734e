//! Copy the JSON history into the SQLite history table.
//!
//! Usage: `promptgrade-migrate` (no flags). Paths follow the same config and
//! `PROMPTGRADE_HOME` rules as `promptgrade`.

use promptgrade::config::Config;
use promptgrade::history::{self, JsonStore, SqliteStore};
use promptgrade::paths::HistoryPaths;

fn run() -> anyhow::Result<i32> {
    let config = Config::load();
    let Some(paths) = HistoryPaths::resolve(config.storage.data_dir.as_deref()) else {
        anyhow::bail!("cannot determine history directory");
    };

    let source = JsonStore::new(&paths.json);
    if !source.exists() {
        println!("JSON history not found: {}", paths.json.display());
        return Ok(0);
    }

    let target = SqliteStore::open(&paths.sqlite)?;
    let report = history::migrate(&source, &target)?;
    for (id, error) in &report.failures {
        println!("failed to insert {id}: {error}");
    }
    println!(
        "Migration complete. Migrated {} of {} entries ({} failed) into {}",
        report.migrated,
        report.total,
        report.failed(),
        paths.sqlite.display()
    );
    Ok(0)
}

fn main() {
    promptgrade::init_logging(false);
    let exit_code = run().unwrap_or_else(|e| {
        eprintln!("[promptgrade] error: {e:#}");
        1
    });
    std::process::exit(exit_code);
}
