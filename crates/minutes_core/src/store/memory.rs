//! In-process tabular store.
//!
//! Keeps whole sheets in memory and counts round trips, which lets callers
//! verify the one-read/one-write contract of mutating operations.

use super::{Sheet, StoreResult, TabularStore};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

/// Single-threaded store holding sheets by table name.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RefCell<BTreeMap<String, Sheet>>,
    reads: Cell<usize>,
    writes: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds one table without counting a write.
    pub fn with_sheet(self, table: &str, sheet: Sheet) -> Self {
        self.tables.borrow_mut().insert(table.to_string(), sheet);
        self
    }

    /// Returns a copy of one table without counting a read.
    pub fn snapshot(&self, table: &str) -> Option<Sheet> {
        self.tables.borrow().get(table).cloned()
    }

    pub fn reads(&self) -> usize {
        self.reads.get()
    }

    pub fn writes(&self) -> usize {
        self.writes.get()
    }
}

impl TabularStore for MemoryStore {
    fn read(&self, table: &str) -> StoreResult<Sheet> {
        self.reads.set(self.reads.get() + 1);
        Ok(self.tables.borrow().get(table).cloned().unwrap_or_default())
    }

    fn write(&self, table: &str, sheet: &Sheet) -> StoreResult<()> {
        self.writes.set(self.writes.get() + 1);
        self.tables
            .borrow_mut()
            .insert(table.to_string(), sheet.clone());
        Ok(())
    }
}
