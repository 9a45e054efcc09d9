//! Record reconciliation and rate-limited persistence for chapter minutes.
//!
//! Settings, rosters and archived minutes live in a spreadsheet-shaped store
//! that replaces whole tables per write and rejects bursts with quota
//! errors. This crate keeps those tables consistent: quota retries, cached
//! reads with explicit invalidation, and one history row per minutes number.

pub mod archive;
pub mod cache;
pub mod config;
pub mod db;
pub mod history;
pub mod layout;
pub mod logging;
pub mod model;
pub mod reconcile;
pub mod retry;
pub mod roster;
pub mod service;
pub mod store;

pub use archive::Archive;
pub use cache::{CacheSlot, SnapshotCache, DEFAULT_CACHE_TTL};
pub use config::{ConfigSnapshot, ConfigStore, LAST_ISSUED_NUMBER_KEY};
pub use history::HistoryReader;
pub use layout::{RosterKind, SheetLayout};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::attendance::{compose_absences, join_visitor_lines};
pub use model::format::{format_brl, format_date_br};
pub use model::meeting::{next_meeting_date, MeetingDefaults};
pub use model::minutes::MinutesRecord;
pub use reconcile::{
    normalize_identifier, ArchiveStatus, ReconcileOutcome, Reconciliation, RecordDraft,
    RecordReconciler,
};
pub use retry::{RetryPolicy, Sleeper, ThreadSleeper};
pub use roster::RosterStore;
pub use service::minutes_service::{
    CounterStatus, FormDefaults, MinutesService, SubmissionReceipt,
};
pub use store::{
    CellValue, MemoryStore, QuotaLimitedStore, Sheet, SheetRow, SqliteStore, StoreError,
    StoreResult, TabularStore,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
