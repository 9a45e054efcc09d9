//! Read-side queries over archived minutes.

use crate::archive::Archive;
use crate::reconcile::{normalize_identifier, resolve_identifier_column};
use crate::store::{StoreError, StoreResult, TabularStore};

/// Cached lookups against the history table.
pub struct HistoryReader<'a, S: TabularStore> {
    archive: Archive<'a, S>,
}

impl<'a, S: TabularStore> HistoryReader<'a, S> {
    pub fn new(archive: Archive<'a, S>) -> Self {
        Self { archive }
    }

    /// Balance of the archived minutes with the greatest number below `number`.
    ///
    /// Returns `None` when there is no earlier record or its balance cell is
    /// not numeric. Rows with non-numeric identifiers are ignored.
    pub fn previous_balance(&self, number: i64) -> StoreResult<Option<f64>> {
        self.archive.cache.balance(number, || {
            let layout = self.archive.layout;
            let sheet = self.archive.read_fresh(&layout.history_table)?;
            if sheet.is_blank() {
                return Ok(None);
            }

            let id_header = resolve_identifier_column(&sheet.columns, &layout.identifier_aliases)
                .ok_or_else(|| {
                    StoreError::Schema(format!(
                        "table `{}` has no identifier column",
                        layout.history_table
                    ))
                })?;
            let balance_header = sheet.find_column(&layout.balance_column);

            let previous = sheet
                .rows
                .iter()
                .filter_map(|row| {
                    let id = normalize_identifier(&row.get(id_header)?.as_text())
                        .parse::<i64>()
                        .ok()?;
                    (id < number).then_some((id, row))
                })
                .max_by_key(|(id, _)| *id);

            Ok(previous.and_then(|(_, row)| {
                balance_header
                    .and_then(|header| row.get(header))
                    .and_then(|cell| cell.as_f64())
            }))
        })
    }
}
