//! Request-quota emulation for tabular stores.
//!
//! The remote spreadsheet service rejects requests once a per-window budget
//! is spent. `QuotaLimitedStore` reproduces that behavior in front of any
//! local backend so retry handling can be exercised end to end.

use super::{Sheet, StoreError, StoreResult, TabularStore};
use log::warn;
use std::cell::RefCell;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct QuotaWindow {
    started_at: Instant,
    used: u32,
}

/// Decorator charging one request per read or write against a fixed budget.
#[derive(Debug)]
pub struct QuotaLimitedStore<S> {
    inner: S,
    budget: u32,
    window: Duration,
    state: RefCell<QuotaWindow>,
}

impl<S: TabularStore> QuotaLimitedStore<S> {
    /// Allows `budget` requests per `window`.
    pub fn new(inner: S, budget: u32, window: Duration) -> Self {
        Self {
            inner,
            budget,
            window,
            state: RefCell::new(QuotaWindow {
                started_at: Instant::now(),
                used: 0,
            }),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Requests still available in the current window.
    pub fn remaining(&self) -> u32 {
        let mut state = self.state.borrow_mut();
        self.roll_window(&mut state);
        self.budget.saturating_sub(state.used)
    }

    fn roll_window(&self, state: &mut QuotaWindow) {
        if state.started_at.elapsed() >= self.window {
            state.started_at = Instant::now();
            state.used = 0;
        }
    }

    fn charge(&self, operation: &'static str) -> StoreResult<()> {
        let mut state = self.state.borrow_mut();
        self.roll_window(&mut state);
        if state.used >= self.budget {
            warn!(
                "event=quota_reject module=store status=error operation={operation} budget={} window_ms={}",
                self.budget,
                self.window.as_millis()
            );
            return Err(StoreError::Quota(format!(
                "429 quota exceeded: {} requests per {} ms",
                self.budget,
                self.window.as_millis()
            )));
        }
        state.used += 1;
        Ok(())
    }
}

impl<S: TabularStore> TabularStore for QuotaLimitedStore<S> {
    fn read(&self, table: &str) -> StoreResult<Sheet> {
        self.charge("read")?;
        self.inner.read(table)
    }

    fn write(&self, table: &str, sheet: &Sheet) -> StoreResult<()> {
        self.charge("write")?;
        self.inner.write(table, sheet)
    }
}
