#![allow(dead_code)]

use minutes_core::{MemoryStore, Sheet, Sleeper, StoreError, StoreResult, TabularStore};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// Memory store that fails scripted calls before delegating.
pub struct FlakyStore {
    pub inner: MemoryStore,
    read_failures: RefCell<VecDeque<StoreError>>,
    table_read_failures: RefCell<HashMap<String, VecDeque<StoreError>>>,
    write_failures: RefCell<VecDeque<StoreError>>,
    read_calls: Cell<usize>,
    write_calls: Cell<usize>,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            read_failures: RefCell::new(VecDeque::new()),
            table_read_failures: RefCell::new(HashMap::new()),
            write_failures: RefCell::new(VecDeque::new()),
            read_calls: Cell::new(0),
            write_calls: Cell::new(0),
        }
    }

    pub fn fail_reads(self, failures: impl IntoIterator<Item = StoreError>) -> Self {
        self.read_failures.borrow_mut().extend(failures);
        self
    }

    /// Fails the next reads of `table` only; other tables read normally.
    pub fn fail_reads_of(self, table: &str, failures: impl IntoIterator<Item = StoreError>) -> Self {
        self.table_read_failures
            .borrow_mut()
            .entry(table.to_string())
            .or_default()
            .extend(failures);
        self
    }

    pub fn fail_writes(self, failures: impl IntoIterator<Item = StoreError>) -> Self {
        self.write_failures.borrow_mut().extend(failures);
        self
    }

    pub fn read_calls(&self) -> usize {
        self.read_calls.get()
    }

    pub fn write_calls(&self) -> usize {
        self.write_calls.get()
    }
}

impl TabularStore for FlakyStore {
    fn read(&self, table: &str) -> StoreResult<Sheet> {
        self.read_calls.set(self.read_calls.get() + 1);
        if let Some(err) = self.read_failures.borrow_mut().pop_front() {
            return Err(err);
        }
        let scripted = self
            .table_read_failures
            .borrow_mut()
            .get_mut(table)
            .and_then(VecDeque::pop_front);
        if let Some(err) = scripted {
            return Err(err);
        }
        self.inner.read(table)
    }

    fn write(&self, table: &str, sheet: &Sheet) -> StoreResult<()> {
        self.write_calls.set(self.write_calls.get() + 1);
        if let Some(err) = self.write_failures.borrow_mut().pop_front() {
            return Err(err);
        }
        self.inner.write(table, sheet)
    }
}

/// Sleeper that records requested delays instead of blocking.
#[derive(Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }

    pub fn total(&self) -> Duration {
        self.delays().into_iter().sum()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

pub fn quota_error() -> StoreError {
    StoreError::Connection("APIError: [429] Quota exceeded for quota metric 'Read requests'".to_string())
}

pub fn text_rows(sheet: &Sheet, column: &str) -> Vec<String> {
    sheet
        .rows
        .iter()
        .map(|row| row.get(column).map(|cell| cell.as_text()).unwrap_or_default())
        .collect()
}
