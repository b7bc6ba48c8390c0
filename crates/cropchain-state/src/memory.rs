use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use cropchain_types::{Clock, SystemClock, TxId};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::traits::{BackingLedger, HistoryCursor};
use crate::world::{SnapshotCursor, WorldState};

/// Failure modes that tests can switch on.
#[derive(Clone, Copy, Debug, Default)]
struct Faults {
    unavailable: bool,
    cursor_fails_after: Option<usize>,
}

/// In-memory backing ledger.
///
/// Intended for tests and embedding. State lives behind a `RwLock`; each
/// write is its own commit with a ledger-assigned [`TxId`] and a commit time
/// read from the injected [`Clock`]. `transact` scopes are serialized by a
/// separate mutex.
pub struct InMemoryLedger {
    clock: Arc<dyn Clock>,
    inner: RwLock<WorldState>,
    tx_lock: Mutex<()>,
    open_cursors: Arc<AtomicUsize>,
    faults: RwLock<Faults>,
}

impl InMemoryLedger {
    /// Create an empty ledger stamped by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty ledger stamped by `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            inner: RwLock::new(WorldState::default()),
            tx_lock: Mutex::new(()),
            open_cursors: Arc::new(AtomicUsize::new(0)),
            faults: RwLock::new(Faults::default()),
        }
    }

    /// Make every subsequent call fail with [`StateError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) -> StateResult<()> {
        let mut faults = self.faults.write().map_err(|_| StateError::LockPoisoned)?;
        faults.unavailable = unavailable;
        Ok(())
    }

    /// Make history cursors fail after yielding `rows` rows.
    pub fn fail_cursors_after(&self, rows: Option<usize>) -> StateResult<()> {
        let mut faults = self.faults.write().map_err(|_| StateError::LockPoisoned)?;
        faults.cursor_fails_after = rows;
        Ok(())
    }

    /// Number of history cursors currently alive.
    pub fn open_cursors(&self) -> usize {
        self.open_cursors.load(Ordering::SeqCst)
    }

    /// Number of keys with a current value.
    pub fn key_count(&self) -> usize {
        self.inner.read().map(|s| s.key_count()).unwrap_or(0)
    }

    /// Sequence number of the last commit.
    pub fn last_seq(&self) -> u64 {
        self.inner.read().map(|s| s.seq()).unwrap_or(0)
    }

    fn faults(&self) -> StateResult<Faults> {
        let faults = *self.faults.read().map_err(|_| StateError::LockPoisoned)?;
        if faults.unavailable {
            return Err(StateError::Unavailable("ledger is offline".into()));
        }
        Ok(faults)
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl BackingLedger for InMemoryLedger {
    fn get_state(&self, key: &str) -> StateResult<Option<Vec<u8>>> {
        self.faults()?;
        let state = self.inner.read().map_err(|_| StateError::LockPoisoned)?;
        Ok(state.get(key).cloned())
    }

    fn put_state(&self, key: &str, value: &[u8]) -> StateResult<TxId> {
        self.faults()?;
        let mut state = self.inner.write().map_err(|_| StateError::LockPoisoned)?;
        let commit = state.prepare_put(key, value, self.clock.now());
        let tx_id = commit.tx_id;
        debug!(key, seq = commit.seq, tx_id = %tx_id.short_hex(), "state put");
        state.apply(commit);
        Ok(tx_id)
    }

    fn delete_state(&self, key: &str) -> StateResult<Option<TxId>> {
        self.faults()?;
        let mut state = self.inner.write().map_err(|_| StateError::LockPoisoned)?;
        let Some(commit) = state.prepare_delete(key, self.clock.now()) else {
            return Ok(None);
        };
        let tx_id = commit.tx_id;
        debug!(key, seq = commit.seq, tx_id = %tx_id.short_hex(), "state delete");
        state.apply(commit);
        Ok(Some(tx_id))
    }

    fn history_for_key(&self, key: &str) -> StateResult<Box<dyn HistoryCursor + '_>> {
        let faults = self.faults()?;
        let state = self.inner.read().map_err(|_| StateError::LockPoisoned)?;
        let cursor = SnapshotCursor::new(state.history_of(key), Arc::clone(&self.open_cursors))
            .fail_after(faults.cursor_fails_after);
        Ok(Box::new(cursor))
    }

    fn transact<T, F>(&self, op: F) -> StateResult<T>
    where
        F: FnOnce() -> T,
    {
        let _guard = self.tx_lock.lock().map_err(|_| StateError::LockPoisoned)?;
        Ok(op())
    }
}

impl fmt::Debug for InMemoryLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryLedger")
            .field("key_count", &self.key_count())
            .field("last_seq", &self.last_seq())
            .field("open_cursors", &self.open_cursors())
            .finish()
    }
}
