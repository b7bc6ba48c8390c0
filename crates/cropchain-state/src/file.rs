use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use cropchain_types::{Clock, SystemClock, TxId};
use tracing::{debug, info};

use crate::error::{StateError, StateResult};
use crate::journal::{Journal, JournalRecord, JournalSync};
use crate::traits::{BackingLedger, HistoryCursor};
use crate::world::{PendingCommit, SnapshotCursor, WorldState};

/// Durable backing ledger over an append-only [`Journal`].
///
/// Opening the ledger replays the journal into an in-memory index.
/// Every write is journalled before it becomes visible, so a reopened ledger
/// reproduces the same current values, commit logs, and transaction ids.
pub struct FileLedger {
    clock: Arc<dyn Clock>,
    journal: Mutex<Journal>,
    index: RwLock<WorldState>,
    tx_lock: Mutex<()>,
    open_cursors: Arc<AtomicUsize>,
}

impl FileLedger {
    /// Open (or create) the ledger journal at `path`, stamped by the system clock.
    pub fn open(path: &Path, sync: JournalSync) -> StateResult<Self> {
        Self::open_with_clock(path, sync, Arc::new(SystemClock))
    }

    /// Open (or create) the ledger journal at `path`, stamped by `clock`.
    pub fn open_with_clock(
        path: &Path,
        sync: JournalSync,
        clock: Arc<dyn Clock>,
    ) -> StateResult<Self> {
        let (journal, records) = Journal::open(path, sync)?;
        Ok(Self::from_journal(journal, records, clock))
    }

    fn from_journal(journal: Journal, records: Vec<JournalRecord>, clock: Arc<dyn Clock>) -> Self {
        let mut index = WorldState::default();
        for record in records {
            index.apply(record.into_commit());
        }

        info!(
            path = %journal.path().display(),
            commits = index.seq(),
            keys = index.key_count(),
            "file ledger opened"
        );

        Self {
            clock,
            journal: Mutex::new(journal),
            index: RwLock::new(index),
            tx_lock: Mutex::new(()),
            open_cursors: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Path of the underlying journal file.
    pub fn path(&self) -> PathBuf {
        self.journal
            .lock()
            .map(|j| j.path().to_path_buf())
            .unwrap_or_default()
    }

    /// Number of history cursors currently alive.
    pub fn open_cursors(&self) -> usize {
        self.open_cursors.load(Ordering::SeqCst)
    }

    /// Sequence number of the last commit.
    pub fn last_seq(&self) -> u64 {
        self.index.read().map(|s| s.seq()).unwrap_or(0)
    }

    /// Journal `commit`, then make it visible. Caller holds the index write lock.
    fn commit(&self, index: &mut WorldState, commit: PendingCommit) -> StateResult<TxId> {
        let tx_id = commit.tx_id;
        let mut journal = self.journal.lock().map_err(|_| StateError::LockPoisoned)?;
        journal.append(&JournalRecord::from_commit(&commit))?;
        debug!(key = %commit.key, seq = commit.seq, tx_id = %tx_id.short_hex(), delete = commit.is_delete, "state commit");
        index.apply(commit);
        Ok(tx_id)
    }
}

impl BackingLedger for FileLedger {
    fn get_state(&self, key: &str) -> StateResult<Option<Vec<u8>>> {
        let index = self.index.read().map_err(|_| StateError::LockPoisoned)?;
        Ok(index.get(key).cloned())
    }

    fn put_state(&self, key: &str, value: &[u8]) -> StateResult<TxId> {
        let mut index = self.index.write().map_err(|_| StateError::LockPoisoned)?;
        let commit = index.prepare_put(key, value, self.clock.now());
        self.commit(&mut index, commit)
    }

    fn delete_state(&self, key: &str) -> StateResult<Option<TxId>> {
        let mut index = self.index.write().map_err(|_| StateError::LockPoisoned)?;
        let Some(commit) = index.prepare_delete(key, self.clock.now()) else {
            return Ok(None);
        };
        self.commit(&mut index, commit).map(Some)
    }

    fn history_for_key(&self, key: &str) -> StateResult<Box<dyn HistoryCursor + '_>> {
        let index = self.index.read().map_err(|_| StateError::LockPoisoned)?;
        Ok(Box::new(SnapshotCursor::new(
            index.history_of(key),
            Arc::clone(&self.open_cursors),
        )))
    }

    fn transact<T, F>(&self, op: F) -> StateResult<T>
    where
        F: FnOnce() -> T,
    {
        let _guard = self.tx_lock.lock().map_err(|_| StateError::LockPoisoned)?;
        Ok(op())
    }
}

impl fmt::Debug for FileLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileLedger")
            .field("path", &self.path())
            .field("last_seq", &self.last_seq())
            .finish()
    }
}
