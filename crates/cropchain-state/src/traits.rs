use cropchain_types::{KeyModification, TxId};

use crate::error::StateResult;

/// Ledger-side cursor over one key's commit log, oldest first.
///
/// The cursor holds ledger resources for as long as it lives; dropping it
/// releases them, whichever way iteration ended.
pub trait HistoryCursor: Iterator<Item = StateResult<KeyModification>> + Send {}

impl<T> HistoryCursor for T where T: Iterator<Item = StateResult<KeyModification>> + Send {}

/// Key-value ledger that versions every write.
///
/// All implementations must satisfy these invariants:
/// - `put_state` replaces the current value and appends a row to that key's
///   history as one atomic step.
/// - `delete_state` removes the current value and appends a tombstone row.
/// - `history_for_key` yields rows in commit order, oldest first.
/// - `transact` runs its closure as one serialized transaction: no other
///   `transact` scope observes or interleaves with its reads and writes.
/// - All I/O errors are propagated, never silently ignored.
pub trait BackingLedger: Send + Sync {
    /// Point lookup of the current value.
    ///
    /// Returns `Ok(None)` if the key has no current value.
    fn get_state(&self, key: &str) -> StateResult<Option<Vec<u8>>>;

    /// Write the current value for `key` and extend its history.
    ///
    /// Returns the id of the transaction that committed the write.
    fn put_state(&self, key: &str, value: &[u8]) -> StateResult<TxId>;

    /// Remove the current value for `key`, recording a tombstone.
    ///
    /// Returns `Ok(None)` without touching history if the key had no value.
    fn delete_state(&self, key: &str) -> StateResult<Option<TxId>>;

    /// Open a cursor over the commit log of `key`.
    ///
    /// A key that was never written yields an empty cursor.
    fn history_for_key(&self, key: &str) -> StateResult<Box<dyn HistoryCursor + '_>>;

    /// Run `op` inside one serialized transaction.
    fn transact<T, F>(&self, op: F) -> StateResult<T>
    where
        F: FnOnce() -> T,
        Self: Sized;

    /// Check whether `key` has a current value.
    fn has_state(&self, key: &str) -> StateResult<bool> {
        Ok(self.get_state(key)?.is_some())
    }

    /// Collect the full commit log of `key`.
    fn read_history(&self, key: &str) -> StateResult<Vec<KeyModification>> {
        self.history_for_key(key)?.collect()
    }
}
