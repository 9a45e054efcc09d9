//! Key/value settings persisted in the Config sheet.
//!
//! # Responsibility
//! - Materialize the Config sheet into a lookup snapshot.
//! - Upsert one or many settings per read/write round trip.
//! - Track the highest minutes number ever committed.
//!
//! # Invariants
//! - Keys are unique; when the sheet holds duplicates the last row wins.
//! - Every successful upsert invalidates the whole snapshot cache.
//! - `record_issued_number` never lowers the stored counter.

use crate::archive::Archive;
use crate::reconcile::normalize_identifier;
use crate::store::{CellValue, Sheet, SheetRow, StoreError, StoreResult, TabularStore};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Highest minutes number committed so far.
pub const LAST_ISSUED_NUMBER_KEY: &str = "ultima_ata";
pub const CONFERENCE_NAME_KEY: &str = "nome_conf";
pub const MEETING_WEEKDAY_KEY: &str = "dia_semana_reuniao";
pub const MEETING_TIME_KEY: &str = "horario_padrao";
pub const MEETING_PLACE_KEY: &str = "local_padrao";
pub const MEETING_CITY_KEY: &str = "cidade_padrao";
pub const PARTICULAR_COUNCIL_KEY: &str = "cons_particular";
pub const CENTRAL_COUNCIL_KEY: &str = "cons_central";
pub const FOUNDATION_DATE_KEY: &str = "data_fundacao";
pub const AGGREGATION_DATE_KEY: &str = "data_agregacao";

/// In-memory view of the Config sheet at load time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    entries: BTreeMap<String, String>,
}

impl ConfigSnapshot {
    /// Builds a snapshot from key/value pairs.
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    /// Reads a Config sheet. A blank sheet yields an empty snapshot.
    pub fn from_sheet(sheet: &Sheet, key_column: &str, value_column: &str) -> StoreResult<Self> {
        if sheet.is_blank() {
            return Ok(Self::default());
        }
        let (key_header, value_header) = config_headers(sheet, key_column, value_column)?;

        let mut entries = BTreeMap::new();
        for row in &sheet.rows {
            let key = cell_text(row, key_header);
            if key.trim().is_empty() {
                continue;
            }
            entries.insert(key, cell_text(row, value_header));
        }
        Ok(Self { entries })
    }

    /// Point lookup returning `default` when `key` is absent.
    pub fn get<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.entries.get(key).map_or(default, String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest committed minutes number; `0` when absent or unparsable.
    pub fn last_issued_number(&self) -> i64 {
        self.entries
            .get(LAST_ISSUED_NUMBER_KEY)
            .and_then(|value| normalize_identifier(value).parse::<i64>().ok())
            .unwrap_or(0)
    }

    /// Number proposed for the next minutes.
    pub fn next_number(&self) -> i64 {
        self.last_issued_number().saturating_add(1)
    }
}

/// Config sheet access bound to one archive.
pub struct ConfigStore<'a, S: TabularStore> {
    archive: Archive<'a, S>,
}

impl<'a, S: TabularStore> ConfigStore<'a, S> {
    pub fn new(archive: Archive<'a, S>) -> Self {
        Self { archive }
    }

    /// Returns the cached snapshot, loading it on miss or expiry.
    pub fn load(&self) -> StoreResult<ConfigSnapshot> {
        self.archive.cache.config(|| {
            let sheet = self.archive.read_fresh(&self.archive.layout.config_table)?;
            self.snapshot_of(&sheet)
        })
    }

    /// Point lookup against the cached snapshot.
    pub fn get(&self, key: &str, default: &str) -> StoreResult<String> {
        Ok(self.load()?.get(key, default).to_string())
    }

    /// Sets one key. One read and one write of the Config sheet.
    pub fn upsert_one(&self, key: &str, value: &str) -> StoreResult<()> {
        self.upsert_batch([(key, value)]).map(|_| ())
    }

    /// Sets every pair in `entries` within a single read/write round trip.
    ///
    /// Returns the number of pairs applied. An empty batch touches nothing.
    pub fn upsert_batch<I, K, V>(&self, entries: I) -> StoreResult<usize>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let entries: Vec<(String, String)> = entries
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        if entries.is_empty() {
            return Ok(0);
        }

        let mut sheet = self.archive.read_fresh(&self.archive.layout.config_table)?;
        self.apply(&mut sheet, &entries)?;
        self.commit(&sheet, entries.len())?;
        Ok(entries.len())
    }

    /// Advances the counter to `number` when it exceeds the stored value.
    ///
    /// Reads the Config sheet fresh, so a stale cache cannot regress it.
    pub fn record_issued_number(&self, number: i64) -> StoreResult<bool> {
        let mut sheet = self.archive.read_fresh(&self.archive.layout.config_table)?;
        let current = self.snapshot_of(&sheet)?.last_issued_number();
        if number <= current {
            info!(
                "event=counter_advance module=config status=ok advanced=false current={current} candidate={number}"
            );
            return Ok(false);
        }

        let entries = [(LAST_ISSUED_NUMBER_KEY.to_string(), number.to_string())];
        self.apply(&mut sheet, &entries)?;
        self.commit(&sheet, 1)?;
        info!(
            "event=counter_advance module=config status=ok advanced=true previous={current} current={number}"
        );
        Ok(true)
    }

    /// Sets the counter unconditionally (operator correction).
    pub fn force_issued_number(&self, number: i64) -> StoreResult<()> {
        self.upsert_one(LAST_ISSUED_NUMBER_KEY, &number.to_string())
    }

    fn snapshot_of(&self, sheet: &Sheet) -> StoreResult<ConfigSnapshot> {
        let layout = self.archive.layout;
        ConfigSnapshot::from_sheet(sheet, &layout.config_key_column, &layout.config_value_column)
    }

    fn apply(&self, sheet: &mut Sheet, entries: &[(String, String)]) -> StoreResult<()> {
        let layout = self.archive.layout;
        if sheet.is_blank() {
            sheet.columns = vec![
                layout.config_key_column.clone(),
                layout.config_value_column.clone(),
            ];
        }
        let (key_header, value_header) = {
            let (key, value) =
                config_headers(sheet, &layout.config_key_column, &layout.config_value_column)?;
            (key.to_string(), value.to_string())
        };

        // Duplicated keys: every matching row is rewritten.
        for (key, value) in entries {
            let mut matched = false;
            for row in sheet
                .rows
                .iter_mut()
                .filter(|row| cell_text(row, &key_header) == *key)
            {
                row.insert(value_header.clone(), CellValue::from(value.as_str()));
                matched = true;
            }
            if !matched {
                let mut row = SheetRow::new();
                row.insert(key_header.clone(), CellValue::from(key.as_str()));
                row.insert(value_header.clone(), CellValue::from(value.as_str()));
                sheet.rows.push(row);
            }
        }
        Ok(())
    }

    fn commit(&self, sheet: &Sheet, changed: usize) -> StoreResult<()> {
        self.archive
            .write(&self.archive.layout.config_table, sheet)?;
        self.archive.cache.invalidate_all();
        info!("event=config_upsert module=config status=ok keys={changed}");
        Ok(())
    }
}

fn config_headers<'s>(
    sheet: &'s Sheet,
    key_column: &str,
    value_column: &str,
) -> StoreResult<(&'s str, &'s str)> {
    let key = sheet.find_column(key_column).ok_or_else(|| {
        StoreError::Schema(format!("config sheet has no `{key_column}` column"))
    })?;
    let value = sheet.find_column(value_column).ok_or_else(|| {
        StoreError::Schema(format!("config sheet has no `{value_column}` column"))
    })?;
    Ok((key, value))
}

fn cell_text(row: &SheetRow, header: &str) -> String {
    row.get(header).map(CellValue::as_text).unwrap_or_default()
}
