//! Minutes submission workflow.
//!
//! # Responsibility
//! - Prepare form defaults from Config and rosters.
//! - Archive a submitted record and advance the issued-number counter.
//!
//! # Invariants
//! - Once the record is composed, `submit` always returns its document.
//!   Archive, counter and config failures are reported in the receipt.
//! - The counter advances only for newly created records and never regresses.

use crate::archive::Archive;
use crate::config::{ConfigSnapshot, ConfigStore};
use crate::history::HistoryReader;
use crate::layout::RosterKind;
use crate::model::meeting::MeetingDefaults;
use crate::model::minutes::MinutesRecord;
use crate::reconcile::{ArchiveStatus, ReconcileOutcome, RecordReconciler};
use crate::roster::RosterStore;
use crate::store::{StoreResult, TabularStore};
use chrono::NaiveDate;
use log::{info, warn};
use std::collections::BTreeMap;

/// Values used to pre-fill a new minutes form.
#[derive(Debug, Clone, PartialEq)]
pub struct FormDefaults {
    pub next_number: i64,
    pub meeting: MeetingDefaults,
    pub members: Vec<String>,
    pub years: Vec<String>,
    /// Balance of the latest earlier minutes, when archived.
    pub previous_balance: Option<f64>,
}

/// What happened to the issued-number counter during a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterStatus {
    Advanced,
    /// Record was updated, not numeric, not archived, or below the counter.
    Unchanged,
    /// Record was created but the counter could not be written; the
    /// caller should retry with `ConfigStore::record_issued_number`.
    Failed { number: i64, message: String },
}

impl CounterStatus {
    pub fn is_advanced(&self) -> bool {
        matches!(self, Self::Advanced)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Advanced => "advanced",
            Self::Unchanged => "unchanged",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Everything the caller needs after one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReceipt {
    pub archive: ArchiveStatus,
    pub counter: CounterStatus,
    /// Flat field map for document templating.
    pub document: BTreeMap<String, String>,
    pub summary: String,
}

/// Service facade over one archive.
pub struct MinutesService<'a, S: TabularStore> {
    archive: Archive<'a, S>,
}

impl<'a, S: TabularStore> MinutesService<'a, S> {
    pub fn new(archive: Archive<'a, S>) -> Self {
        Self { archive }
    }

    /// Loads defaults for a new form. Reads go through the cache.
    pub fn prepare_form(&self, today: NaiveDate) -> StoreResult<FormDefaults> {
        let config = ConfigStore::new(self.archive).load()?;
        let roster = RosterStore::new(self.archive);
        let next_number = config.next_number();

        Ok(FormDefaults {
            next_number,
            meeting: MeetingDefaults::from_config(&config, today),
            members: roster.names(RosterKind::Members)?,
            years: roster.names(RosterKind::Years)?,
            previous_balance: HistoryReader::new(self.archive).previous_balance(next_number)?,
        })
    }

    /// Archives `record`, advances the counter on creation, and returns the
    /// document projection.
    ///
    /// Store failures never abort the submission: they surface as
    /// `ArchiveStatus::Failed` or `CounterStatus::Failed`, and a Config read
    /// failure renders the document with default settings.
    pub fn submit(&self, record: &MinutesRecord) -> SubmissionReceipt {
        let config_store = ConfigStore::new(self.archive);
        let draft = record.to_draft(&self.archive.layout.identifier_header);
        let archive = RecordReconciler::new(self.archive).archive(&draft);

        let counter = match (archive.outcome(), record.numeric_number()) {
            (Some(ReconcileOutcome::Created), Some(number)) => {
                match config_store.record_issued_number(number) {
                    Ok(true) => CounterStatus::Advanced,
                    Ok(false) => CounterStatus::Unchanged,
                    Err(err) => {
                        warn!(
                            "event=minutes_submit module=service status=error stage=counter number={number} error_code={} error={err}",
                            err.code()
                        );
                        CounterStatus::Failed {
                            number,
                            message: format!("counter update failed: {err}"),
                        }
                    }
                }
            }
            _ => CounterStatus::Unchanged,
        };

        let config = config_store.load().unwrap_or_else(|err| {
            warn!(
                "event=minutes_submit module=service status=recovered stage=config error_code={} error={err}",
                err.code()
            );
            ConfigSnapshot::default()
        });
        info!(
            "event=minutes_submit module=service status=ok archived={} outcome={} counter={}",
            archive.is_archived(),
            archive.outcome().map_or("none", ReconcileOutcome::as_str),
            counter.as_str()
        );

        SubmissionReceipt {
            document: record.document_fields(&config),
            summary: record.share_summary(),
            archive,
            counter,
        }
    }
}
