//! Memoized sheet reads with explicit invalidation.
//!
//! # Responsibility
//! - Serve repeated reads of Config, rosters and prior balances without
//!   spending store quota.
//! - Give mutating components one place to drop stale state.
//!
//! # Invariants
//! - Entries older than the TTL are reloaded on next access.
//! - A failed load leaves the slot empty; errors are never memoized.
//! - Reconciliation never reads through this cache.

use crate::config::ConfigSnapshot;
use crate::layout::RosterKind;
use crate::store::StoreResult;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::{Duration, Instant};

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone)]
struct Memo<T> {
    value: T,
    loaded_at: Instant,
}

impl<T> Memo<T> {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.loaded_at.elapsed() < ttl
    }
}

/// Cache slot names, used for inspection and targeted invalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSlot {
    Config,
    Roster(RosterKind),
    Balances,
}

/// Session-scoped read cache injected into every store-facing component.
#[derive(Debug)]
pub struct SnapshotCache {
    ttl: Duration,
    config: RefCell<Option<Memo<ConfigSnapshot>>>,
    members: RefCell<Option<Memo<Vec<String>>>>,
    years: RefCell<Option<Memo<Vec<String>>>>,
    balances: RefCell<HashMap<i64, Memo<Option<f64>>>>,
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl SnapshotCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            config: RefCell::new(None),
            members: RefCell::new(None),
            years: RefCell::new(None),
            balances: RefCell::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the memoized Config snapshot or loads it.
    pub fn config(
        &self,
        load: impl FnOnce() -> StoreResult<ConfigSnapshot>,
    ) -> StoreResult<ConfigSnapshot> {
        memoized(&self.config, self.ttl, CacheSlot::Config, load)
    }

    /// Returns the memoized roster names or loads them.
    pub fn roster(
        &self,
        kind: RosterKind,
        load: impl FnOnce() -> StoreResult<Vec<String>>,
    ) -> StoreResult<Vec<String>> {
        memoized(self.roster_slot(kind), self.ttl, CacheSlot::Roster(kind), load)
    }

    /// Returns the memoized prior balance for `number` or loads it.
    pub fn balance(
        &self,
        number: i64,
        load: impl FnOnce() -> StoreResult<Option<f64>>,
    ) -> StoreResult<Option<f64>> {
        if let Some(memo) = self.balances.borrow().get(&number) {
            if memo.is_fresh(self.ttl) {
                return Ok(memo.value);
            }
        }

        let value = load()?;
        self.balances.borrow_mut().insert(
            number,
            Memo {
                value,
                loaded_at: Instant::now(),
            },
        );
        Ok(value)
    }

    /// Returns whether `slot` currently holds a fresh value.
    pub fn is_cached(&self, slot: CacheSlot) -> bool {
        match slot {
            CacheSlot::Config => is_fresh(&self.config, self.ttl),
            CacheSlot::Roster(kind) => is_fresh(self.roster_slot(kind), self.ttl),
            CacheSlot::Balances => self
                .balances
                .borrow()
                .values()
                .any(|memo| memo.is_fresh(self.ttl)),
        }
    }

    pub fn invalidate_config(&self) {
        self.config.borrow_mut().take();
    }

    pub fn invalidate_roster(&self, kind: RosterKind) {
        self.roster_slot(kind).borrow_mut().take();
    }

    pub fn invalidate_balances(&self) {
        self.balances.borrow_mut().clear();
    }

    /// Drops every memoized value so the next read hits the store.
    pub fn invalidate_all(&self) {
        self.invalidate_config();
        self.invalidate_roster(RosterKind::Members);
        self.invalidate_roster(RosterKind::Years);
        self.invalidate_balances();
        debug!("event=cache_invalidate module=cache status=ok scope=all");
    }

    fn roster_slot(&self, kind: RosterKind) -> &RefCell<Option<Memo<Vec<String>>>> {
        match kind {
            RosterKind::Members => &self.members,
            RosterKind::Years => &self.years,
        }
    }
}

fn is_fresh<T>(slot: &RefCell<Option<Memo<T>>>, ttl: Duration) -> bool {
    slot.borrow().as_ref().is_some_and(|memo| memo.is_fresh(ttl))
}

fn memoized<T: Clone>(
    slot: &RefCell<Option<Memo<T>>>,
    ttl: Duration,
    name: CacheSlot,
    load: impl FnOnce() -> StoreResult<T>,
) -> StoreResult<T> {
    if let Some(memo) = slot.borrow().as_ref() {
        if memo.is_fresh(ttl) {
            return Ok(memo.value.clone());
        }
    }

    debug!("event=cache_miss module=cache status=start slot={name:?}");
    let value = load()?;
    *slot.borrow_mut() = Some(Memo {
        value: value.clone(),
        loaded_at: Instant::now(),
    });
    Ok(value)
}
