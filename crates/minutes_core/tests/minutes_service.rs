mod common;

use chrono::NaiveDate;
use common::FlakyStore;
use std::time::Duration;
use minutes_core::{
    Archive, ArchiveStatus, CellValue, ConfigStore, CounterStatus, MemoryStore, MinutesRecord, MinutesService,
    ReconcileOutcome, RetryPolicy, Sheet, SheetLayout, SnapshotCache, StoreError,
    LAST_ISSUED_NUMBER_KEY,
};

fn record(number: &str, balance: f64) -> MinutesRecord {
    MinutesRecord {
        number: number.to_string(),
        meeting_date: NaiveDate::from_ymd_opt(2024, 6, 13).unwrap(),
        president: "Ana".to_string(),
        secretary: "Bruno".to_string(),
        reading_source: "Mateus 25".to_string(),
        present: vec!["Ana".to_string(), "Bruno".to_string()],
        absences: "Não houve.".to_string(),
        visitors: String::new(),
        income: 120.0,
        expense: 30.0,
        weekly_tithe: 12.0,
        balance,
        socioeconomic: String::new(),
        news: String::new(),
        free_word: String::new(),
    }
}

fn seeded_store() -> MemoryStore {
    MemoryStore::new()
        .with_sheet(
            "Config",
            Sheet::new(["Chave", "Valor"])
                .with_row([
                    ("Chave", CellValue::from(LAST_ISSUED_NUMBER_KEY)),
                    ("Valor", CellValue::from("20")),
                ])
                .with_row([
                    ("Chave", CellValue::from("dia_semana_reuniao")),
                    ("Valor", CellValue::from("3")),
                ]),
        )
        .with_sheet(
            "Membros",
            Sheet::new(["Nome"])
                .with_row([("Nome", "Ana")])
                .with_row([("Nome", "Bruno")]),
        )
        .with_sheet("Anos", Sheet::new(["Ano"]).with_row([("Ano", "2024")]))
        .with_sheet(
            "Historico",
            Sheet::new(["Numero", "Saldo"])
                .with_row([("Numero", CellValue::from("19")), ("Saldo", CellValue::from(500.0))])
                .with_row([("Numero", CellValue::from("20")), ("Saldo", CellValue::from(610.0))]),
        )
}

#[test]
fn prepare_form_collects_defaults() {
    let store = seeded_store();
    let (retry, cache, layout) = (RetryPolicy::default(), SnapshotCache::default(), SheetLayout::default());
    let service = MinutesService::new(Archive::new(&store, &retry, &cache, &layout));

    // 2024-06-10 is a Monday; weekday 3 is Thursday.
    let defaults = service
        .prepare_form(NaiveDate::from_ymd_opt(2024, 6, 10).unwrap())
        .unwrap();

    assert_eq!(defaults.next_number, 21);
    assert_eq!(defaults.meeting.date, NaiveDate::from_ymd_opt(2024, 6, 13).unwrap());
    assert_eq!(defaults.members, vec!["Ana", "Bruno"]);
    assert_eq!(defaults.years, vec!["2024"]);
    assert_eq!(defaults.previous_balance, Some(610.0));
}

#[test]
fn new_minutes_are_archived_and_advance_counter() {
    let store = seeded_store();
    let (retry, cache, layout) = (RetryPolicy::default(), SnapshotCache::default(), SheetLayout::default());
    let archive = Archive::new(&store, &retry, &cache, &layout);
    let service = MinutesService::new(archive);

    let receipt = service.submit(&record("21", 700.0));

    assert_eq!(receipt.archive.outcome(), Some(ReconcileOutcome::Created));
    assert_eq!(receipt.counter, CounterStatus::Advanced);
    assert_eq!(receipt.document["num_ata"], "21");
    assert_eq!(receipt.document["saldo"], "R$ 700,00");
    assert!(receipt.summary.contains("13/06/2024"));
    assert_eq!(ConfigStore::new(archive).load().unwrap().last_issued_number(), 21);
    assert_eq!(store.snapshot("Historico").unwrap().rows.len(), 3);
}

#[test]
fn corrected_minutes_update_without_moving_counter() {
    let store = seeded_store();
    let (retry, cache, layout) = (RetryPolicy::default(), SnapshotCache::default(), SheetLayout::default());
    let archive = Archive::new(&store, &retry, &cache, &layout);
    let service = MinutesService::new(archive);

    let receipt = service.submit(&record("19.0", 505.0));

    assert_eq!(receipt.archive.outcome(), Some(ReconcileOutcome::Updated));
    assert_eq!(receipt.counter, CounterStatus::Unchanged);
    let history = store.snapshot("Historico").unwrap();
    assert_eq!(history.rows.len(), 2);
    assert_eq!(history.rows[0].get("Saldo"), Some(&CellValue::Number(505.0)));
    assert_eq!(ConfigStore::new(archive).load().unwrap().last_issued_number(), 20);
}

#[test]
fn created_minutes_below_counter_do_not_regress_it() {
    let store = seeded_store();
    let (retry, cache, layout) = (RetryPolicy::default(), SnapshotCache::default(), SheetLayout::default());
    let archive = Archive::new(&store, &retry, &cache, &layout);

    let receipt = MinutesService::new(archive).submit(&record("5", 0.0));

    assert_eq!(receipt.archive.outcome(), Some(ReconcileOutcome::Created));
    assert_eq!(receipt.counter, CounterStatus::Unchanged);
    assert_eq!(ConfigStore::new(archive).load().unwrap().last_issued_number(), 20);
}

#[test]
fn archive_failure_still_returns_document() {
    let store = FlakyStore::new(seeded_store())
        .fail_writes([StoreError::Connection("sheet is protected".to_string())]);
    let (retry, cache, layout) = (RetryPolicy::default(), SnapshotCache::default(), SheetLayout::default());
    let service = MinutesService::new(Archive::new(&store, &retry, &cache, &layout));

    let receipt = service.submit(&record("21", 700.0));

    assert!(matches!(receipt.archive, ArchiveStatus::Failed { .. }));
    assert_eq!(receipt.counter, CounterStatus::Unchanged);
    assert_eq!(receipt.document["num_ata"], "21");
    assert_eq!(store.inner.snapshot("Historico").unwrap().rows.len(), 2);
}

#[test]
fn counter_failure_after_creation_is_reported_and_document_returned() {
    let store = FlakyStore::new(seeded_store())
        .fail_reads_of("Config", [StoreError::Connection("offline".to_string())]);
    let (retry, cache, layout) = (RetryPolicy::default(), SnapshotCache::default(), SheetLayout::default());
    let archive = Archive::new(&store, &retry, &cache, &layout);

    let receipt = MinutesService::new(archive).submit(&record("21", 700.0));

    assert_eq!(receipt.archive.outcome(), Some(ReconcileOutcome::Created));
    match &receipt.counter {
        CounterStatus::Failed { number, message } => {
            assert_eq!(*number, 21);
            assert!(message.contains("offline"));
        }
        other => panic!("expected counter failure, got {other:?}"),
    }
    assert_eq!(receipt.document["num_ata"], "21");
    assert_eq!(store.inner.snapshot("Historico").unwrap().rows.len(), 3);

    // The reported number lets the caller repair the counter once the store is back.
    assert!(ConfigStore::new(archive).record_issued_number(21).unwrap());
    assert_eq!(ConfigStore::new(archive).load().unwrap().next_number(), 22);
}

#[test]
fn unreachable_store_with_cold_cache_still_returns_document() {
    let offline = || StoreError::Connection("offline".to_string());
    let store = FlakyStore::new(seeded_store())
        .fail_reads((0..10).map(|_| offline()))
        .fail_writes((0..10).map(|_| offline()));
    let retry = RetryPolicy::new(3, Duration::ZERO);
    let (cache, layout) = (SnapshotCache::default(), SheetLayout::default());
    let service = MinutesService::new(Archive::new(&store, &retry, &cache, &layout));

    let receipt = service.submit(&record("21", 700.0));

    assert!(matches!(receipt.archive, ArchiveStatus::Failed { .. }));
    assert_eq!(receipt.counter, CounterStatus::Unchanged);
    assert_eq!(receipt.document["num_ata"], "21");
    assert_eq!(receipt.document["saldo"], "R$ 700,00");
    assert!(receipt.summary.contains("13/06/2024"));
    assert_eq!(store.write_calls(), 0);
    assert_eq!(store.inner.snapshot("Historico").unwrap().rows.len(), 2);
}

#[test]
fn blank_history_uses_the_layout_identifier_header() {
    let store = MemoryStore::new();
    let layout = SheetLayout {
        identifier_header: "Nº".to_string(),
        ..SheetLayout::default()
    };
    let (retry, cache) = (RetryPolicy::default(), SnapshotCache::default());
    let service = MinutesService::new(Archive::new(&store, &retry, &cache, &layout));

    let receipt = service.submit(&record("1", 10.0));

    assert_eq!(receipt.archive.outcome(), Some(ReconcileOutcome::Created));
    let history = store.snapshot("Historico").unwrap();
    assert_eq!(history.columns.first().map(String::as_str), Some("Nº"));
    assert_eq!(history.rows[0].get("Nº"), Some(&CellValue::from("1")));
}
