//! Members and thematic-year lists.
//!
//! # Invariants
//! - A name appears at most once per list after `add`.
//! - Every successful mutation invalidates the snapshot cache.
//! - Blank cells are never reported as names.

use crate::archive::Archive;
use crate::layout::RosterKind;
use crate::store::{CellValue, Sheet, SheetRow, StoreError, StoreResult, TabularStore};
use log::info;

/// Set-like list management over a single-column sheet.
pub struct RosterStore<'a, S: TabularStore> {
    archive: Archive<'a, S>,
}

impl<'a, S: TabularStore> RosterStore<'a, S> {
    pub fn new(archive: Archive<'a, S>) -> Self {
        Self { archive }
    }

    /// Lists names in stored order, served from cache when fresh.
    pub fn names(&self, kind: RosterKind) -> StoreResult<Vec<String>> {
        self.archive.cache.roster(kind, || {
            let (table, column) = self.archive.layout.roster(kind);
            let sheet = self.archive.read_fresh(table)?;
            Ok(collect_names(&sheet, column))
        })
    }

    /// Appends `name` unless it is already listed. Returns whether it was added.
    pub fn add(&self, kind: RosterKind, name: &str) -> StoreResult<bool> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::InvalidData(format!(
                "{} entry cannot be blank",
                kind.as_str()
            )));
        }

        let (table, column) = self.archive.layout.roster(kind);
        let mut sheet = self.archive.read_fresh(table)?;
        let header = sheet.ensure_column(column);
        if collect_names(&sheet, &header).iter().any(|existing| existing == name) {
            info!(
                "event=roster_add module=roster status=ok list={} changed=false",
                kind.as_str()
            );
            return Ok(false);
        }

        let mut row = SheetRow::new();
        row.insert(header, CellValue::from(name));
        sheet.rows.push(row);
        self.commit(kind, table, &sheet, "roster_add")?;
        Ok(true)
    }

    /// Removes every row holding `name`. Returns whether anything was removed.
    pub fn remove(&self, kind: RosterKind, name: &str) -> StoreResult<bool> {
        let name = name.trim();
        let (table, column) = self.archive.layout.roster(kind);
        let mut sheet = self.archive.read_fresh(table)?;
        let Some(header) = sheet.find_column(column).map(str::to_string) else {
            return Ok(false);
        };

        let before = sheet.rows.len();
        sheet.rows.retain(|row| {
            row.get(&header)
                .map_or(true, |cell| cell.as_text().trim() != name)
        });
        if sheet.rows.len() == before {
            return Ok(false);
        }

        self.commit(kind, table, &sheet, "roster_remove")?;
        Ok(true)
    }

    fn commit(&self, kind: RosterKind, table: &str, sheet: &Sheet, event: &str) -> StoreResult<()> {
        self.archive.write(table, sheet)?;
        self.archive.cache.invalidate_all();
        info!(
            "event={event} module=roster status=ok list={} changed=true size={}",
            kind.as_str(),
            sheet.rows.len()
        );
        Ok(())
    }
}

fn collect_names(sheet: &Sheet, column: &str) -> Vec<String> {
    let Some(header) = sheet.find_column(column) else {
        return Vec::new();
    };
    sheet
        .column_values(header)
        .filter(|cell| !cell.is_blank())
        .map(|cell| cell.as_text().trim().to_string())
        .collect()
}
