//! Find-or-create reconciliation of minutes records.
//!
//! # Responsibility
//! - Map one submitted record onto at most one row of the history table.
//! - Update matching rows in place, append otherwise.
//! - Downgrade persistence failures so document generation can continue.
//!
//! # Invariants
//! - At most one row per normalized identifier is created by this module.
//! - Each reconciliation performs exactly one table read and one table write
//!   (retries of the same request excluded).
//! - The history table is always read fresh, never through the cache.
//! - Only fields present in the draft are overwritten; other cells survive.

use crate::archive::Archive;
use crate::store::{fold_header, CellValue, Sheet, SheetRow, StoreError, StoreResult, TabularStore};
use log::{info, warn};

/// Minimum folded alias length allowed to match by containment.
const MIN_CONTAINMENT_ALIAS_CHARS: usize = 3;

/// Canonical identifier key: trimmed, with one trailing `.0` removed.
///
/// `"42"`, `"42.0"` and `" 42 "` all normalize to `"42"`.
pub fn normalize_identifier(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .strip_suffix(".0")
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}

/// Resolves the identifier header of `columns` against ordered `aliases`.
///
/// Exact folded matches win over containment matches; within each pass the
/// alias order decides. Short aliases (`nº`) only match exactly.
pub fn resolve_identifier_column<'c>(columns: &'c [String], aliases: &[String]) -> Option<&'c str> {
    let folded: Vec<String> = columns.iter().map(|column| fold_header(column)).collect();
    let aliases: Vec<String> = aliases.iter().map(|alias| fold_header(alias)).collect();

    let exact = aliases.iter().find_map(|alias| {
        folded
            .iter()
            .position(|column| column == alias)
    });
    let position = exact.or_else(|| {
        aliases
            .iter()
            .filter(|alias| alias.chars().count() >= MIN_CONTAINMENT_ALIAS_CHARS)
            .find_map(|alias| folded.iter().position(|column| column.contains(alias.as_str())))
    })?;
    Some(columns[position].as_str())
}

/// Application-level record ready for reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDraft {
    /// Raw identifier as typed or round-tripped; normalized before matching.
    pub identifier: String,
    /// Header used when the target table has no columns yet.
    pub identifier_header: String,
    /// `(header, value)` pairs to write; headers match case/accent-insensitively.
    pub fields: Vec<(String, CellValue)>,
}

impl RecordDraft {
    /// `identifier_header` is usually `SheetLayout::identifier_header`.
    pub fn new(identifier: impl Into<String>, identifier_header: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            identifier_header: identifier_header.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, header: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.fields.push((header.into(), value.into()));
        self
    }
}

/// Classification of a submission relative to the stored table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Identifier was absent; a row was appended.
    Created,
    /// Identifier was present; the row was overwritten in place.
    Updated,
}

impl ReconcileOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
        }
    }
}

/// Result of one successful reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub outcome: ReconcileOutcome,
    /// Normalized identifier that was matched or inserted.
    pub identifier: String,
    /// Zero-based data row index of the affected row.
    pub row_index: usize,
}

/// Archive attempt result reported to the submission workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveStatus {
    Archived(Reconciliation),
    /// Persistence failed; the caller may still produce its document.
    Failed { message: String },
}

impl ArchiveStatus {
    pub fn is_archived(&self) -> bool {
        matches!(self, Self::Archived(_))
    }

    pub fn outcome(&self) -> Option<ReconcileOutcome> {
        match self {
            Self::Archived(reconciliation) => Some(reconciliation.outcome),
            Self::Failed { .. } => None,
        }
    }
}

/// Reconciles drafts against a records table.
pub struct RecordReconciler<'a, S: TabularStore> {
    archive: Archive<'a, S>,
}

impl<'a, S: TabularStore> RecordReconciler<'a, S> {
    pub fn new(archive: Archive<'a, S>) -> Self {
        Self { archive }
    }

    /// Finds the row whose normalized identifier matches `draft`, then
    /// updates it or appends a new one and writes the table back.
    ///
    /// # Errors
    /// - `StoreError::Schema` when no header matches `aliases`.
    /// - `StoreError::InvalidData` when the identifier normalizes to blank.
    /// - Store failures after the retry policy gives up.
    pub fn reconcile(
        &self,
        table: &str,
        aliases: &[String],
        draft: &RecordDraft,
    ) -> StoreResult<Reconciliation> {
        let identifier = normalize_identifier(&draft.identifier);
        if identifier.is_empty() {
            return Err(StoreError::InvalidData(
                "record identifier is blank".to_string(),
            ));
        }

        let mut sheet = self.archive.read_fresh(table)?;
        if sheet.columns.is_empty() {
            sheet.columns.push(draft.identifier_header.clone());
        }
        let id_header = resolve_identifier_column(&sheet.columns, aliases)
            .map(str::to_string)
            .ok_or_else(|| {
                StoreError::Schema(format!(
                    "table `{table}` has no identifier column matching {aliases:?}"
                ))
            })?;

        let existing = sheet.rows.iter().position(|row| {
            row.get(&id_header)
                .is_some_and(|cell| normalize_identifier(&cell.as_text()) == identifier)
        });

        let (outcome, row_index) = match existing {
            Some(index) => (ReconcileOutcome::Updated, index),
            None => {
                sheet.rows.push(SheetRow::new());
                (ReconcileOutcome::Created, sheet.rows.len() - 1)
            }
        };
        merge_fields(&mut sheet, row_index, &id_header, &identifier, draft);

        self.archive.write(table, &sheet)?;
        self.archive.cache.invalidate_all();

        info!(
            "event=record_reconcile module=reconcile status=ok outcome={} row_index={row_index} rows={}",
            outcome.as_str(),
            sheet.rows.len()
        );
        Ok(Reconciliation {
            outcome,
            identifier,
            row_index,
        })
    }

    /// Reconciles into the layout's history table, never failing.
    ///
    /// Errors are logged and returned as `ArchiveStatus::Failed`.
    pub fn archive(&self, draft: &RecordDraft) -> ArchiveStatus {
        let layout = self.archive.layout;
        match self.reconcile(&layout.history_table, &layout.identifier_aliases, draft) {
            Ok(reconciliation) => ArchiveStatus::Archived(reconciliation),
            Err(err) => {
                warn!(
                    "event=record_archive module=reconcile status=recovered error_code={} error={}",
                    err.code(),
                    err
                );
                ArchiveStatus::Failed {
                    message: format!("archive failed: {err}"),
                }
            }
        }
    }
}

fn merge_fields(
    sheet: &mut Sheet,
    row_index: usize,
    id_header: &str,
    identifier: &str,
    draft: &RecordDraft,
) {
    let id_key = fold_header(id_header);
    let mut cells = Vec::with_capacity(draft.fields.len() + 1);
    cells.push((id_header.to_string(), CellValue::from(identifier)));
    for (header, value) in &draft.fields {
        if fold_header(header) == id_key {
            continue;
        }
        let stored = sheet.ensure_column(header);
        cells.push((stored, value.clone()));
    }

    let row = &mut sheet.rows[row_index];
    for (header, value) in cells {
        row.insert(header, value);
    }
}
