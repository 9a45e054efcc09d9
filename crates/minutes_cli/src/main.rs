//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `minutes_core` linkage without any UI runtime.
//! - Optionally open a local archive file and print the next minutes number.
//!
//! Usage: `minutes_cli [ARCHIVE_PATH]`

use minutes_core::db::open_db;
use minutes_core::{Archive, ConfigStore, RetryPolicy, SheetLayout, SnapshotCache, SqliteStore};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("minutes_core version={}", minutes_core::core_version());

    let Some(path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };

    let conn = match open_db(&path) {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("failed to open archive `{path}`: {err}");
            return ExitCode::FAILURE;
        }
    };

    let store = SqliteStore::new(&conn);
    let retry = RetryPolicy::default();
    let cache = SnapshotCache::default();
    let layout = SheetLayout::default();
    let archive = Archive::new(&store, &retry, &cache, &layout);

    match ConfigStore::new(archive).load() {
        Ok(config) => {
            println!("last_issued_number={}", config.last_issued_number());
            println!("next_number={}", config.next_number());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("failed to read config: {err}");
            ExitCode::FAILURE
        }
    }
}
