//! Shared handles for store-facing components.

use crate::cache::SnapshotCache;
use crate::layout::SheetLayout;
use crate::retry::RetryPolicy;
use crate::store::{Sheet, StoreResult, TabularStore};

/// Borrowed bundle of store, retry policy, cache and layout.
///
/// Every component that touches the store is built from one `Archive`, so
/// they all invalidate the same cache and retry with the same policy.
pub struct Archive<'a, S: TabularStore> {
    pub store: &'a S,
    pub retry: &'a RetryPolicy,
    pub cache: &'a SnapshotCache,
    pub layout: &'a SheetLayout,
}

impl<S: TabularStore> Clone for Archive<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: TabularStore> Copy for Archive<'_, S> {}

impl<'a, S: TabularStore> Archive<'a, S> {
    pub fn new(
        store: &'a S,
        retry: &'a RetryPolicy,
        cache: &'a SnapshotCache,
        layout: &'a SheetLayout,
    ) -> Self {
        Self {
            store,
            retry,
            cache,
            layout,
        }
    }

    /// Reads `table` straight from the store, retrying quota failures.
    pub fn read_fresh(&self, table: &str) -> StoreResult<Sheet> {
        self.retry.execute("read", || self.store.read(table))
    }

    /// Replaces `table`, retrying quota failures.
    pub fn write(&self, table: &str, sheet: &Sheet) -> StoreResult<()> {
        self.retry.execute("write", || self.store.write(table, sheet))
    }
}
