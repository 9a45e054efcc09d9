mod common;

use common::RecordingSleeper;
use minutes_core::db::migrations::latest_version;
use minutes_core::db::{open_db, open_db_in_memory};
use minutes_core::{
    Archive, ArchiveStatus, CellValue, ConfigStore, QuotaLimitedStore, ReconcileOutcome,
    RecordDraft, RecordReconciler, RetryPolicy, Sheet, SheetLayout, SnapshotCache, SqliteStore,
    StoreError, TabularStore,
};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn migrations_set_user_version() {
    let conn = open_db_in_memory().unwrap();
    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, latest_version());
}

#[test]
fn sheet_roundtrip_preserves_column_order_and_cell_kinds() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::new(&conn);
    let sheet = Sheet::new(["Numero", "Saldo", "Visitantes"]).with_row([
        ("Numero", CellValue::from("1")),
        ("Saldo", CellValue::from(12.5)),
        ("Visitantes", CellValue::Empty),
    ]);

    store.write("Historico", &sheet).unwrap();
    let loaded = store.read("Historico").unwrap();

    assert_eq!(loaded, sheet);
    let payload: String = conn
        .query_row(
            "SELECT payload FROM sheet_rows WHERE sheet = 'Historico';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&payload).unwrap();
    assert_eq!(json["Saldo"], serde_json::json!(12.5));
    assert!(json["Visitantes"].is_null());
}

#[test]
fn archive_file_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("atas.sqlite3");
    let (retry, layout) = (RetryPolicy::default(), SheetLayout::default());

    {
        let conn = open_db(&path).unwrap();
        let store = SqliteStore::new(&conn);
        let cache = SnapshotCache::default();
        let archive = Archive::new(&store, &retry, &cache, &layout);
        RecordReconciler::new(archive)
            .reconcile(
                "Historico",
                &layout.identifier_aliases,
                &RecordDraft::new("1", "Numero").field("Saldo", 10.0),
            )
            .unwrap();
        ConfigStore::new(archive).record_issued_number(1).unwrap();
    }

    let conn = open_db(&path).unwrap();
    let store = SqliteStore::new(&conn);
    let cache = SnapshotCache::default();
    let archive = Archive::new(&store, &retry, &cache, &layout);

    let result = RecordReconciler::new(archive)
        .reconcile(
            "Historico",
            &layout.identifier_aliases,
            &RecordDraft::new("1.0", "Numero").field("Saldo", 20.0),
        )
        .unwrap();
    assert_eq!(result.outcome, ReconcileOutcome::Updated);
    assert_eq!(store.read("Historico").unwrap().rows.len(), 1);
    assert_eq!(ConfigStore::new(archive).load().unwrap().last_issued_number(), 1);
}

#[test]
fn quota_limited_backend_is_absorbed_by_retry_until_exhausted() {
    let conn = open_db_in_memory().unwrap();
    let store = QuotaLimitedStore::new(SqliteStore::new(&conn), 1, Duration::from_secs(3600));
    let sleeper = Arc::new(RecordingSleeper::default());
    let retry = RetryPolicy::new(3, Duration::from_millis(5)).with_sleeper(sleeper.clone());
    let (cache, layout) = (SnapshotCache::default(), SheetLayout::default());
    let archive = Archive::new(&store, &retry, &cache, &layout);

    // The read spends the whole budget; the write can never get through.
    let status = RecordReconciler::new(archive).archive(&RecordDraft::new("4", "Numero"));

    match status {
        ArchiveStatus::Failed { message } => assert!(message.contains("overloaded")),
        other => panic!("expected overloaded failure, got {other:?}"),
    }
    assert_eq!(
        sleeper.delays(),
        vec![Duration::from_millis(10), Duration::from_millis(20)]
    );
    assert!(store.inner().read("Historico").unwrap().is_blank());
}

#[test]
fn unsupported_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");
    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch("PRAGMA user_version = 99;").unwrap();
    }

    let err = StoreError::from(open_db(&path).unwrap_err());
    assert!(err.to_string().contains("newer than supported"));
    assert!(!err.is_transient());
}
