//! World-state index shared by the ledger backends.
//!
//! [`WorldState`] keeps the current value of every key alongside its commit
//! log. [`SnapshotCursor`] hands out a point-in-time copy of one key's log
//! and tracks itself in a shared open-cursor counter until dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use cropchain_types::{KeyModification, TxId};

use crate::error::{StateError, StateResult};

/// Current values plus per-key commit logs.
#[derive(Debug, Default)]
pub(crate) struct WorldState {
    current: HashMap<String, Vec<u8>>,
    history: HashMap<String, Vec<KeyModification>>,
    /// Sequence number of the last commit across all keys.
    seq: u64,
}

/// A commit that has been ordered but not yet applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PendingCommit {
    pub seq: u64,
    pub tx_id: TxId,
    pub timestamp: DateTime<Utc>,
    pub key: String,
    pub value: Vec<u8>,
    pub is_delete: bool,
}

impl WorldState {
    pub fn get(&self, key: &str) -> Option<&Vec<u8>> {
        self.current.get(key)
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn key_count(&self) -> usize {
        self.current.len()
    }

    /// Order the next write of `value` under `key` without applying it.
    pub fn prepare_put(&self, key: &str, value: &[u8], timestamp: DateTime<Utc>) -> PendingCommit {
        let seq = self.seq + 1;
        PendingCommit {
            seq,
            tx_id: TxId::derive(seq, key, value),
            timestamp,
            key: key.to_string(),
            value: value.to_vec(),
            is_delete: false,
        }
    }

    /// Order the next deletion of `key`, or `None` if it has no current value.
    pub fn prepare_delete(&self, key: &str, timestamp: DateTime<Utc>) -> Option<PendingCommit> {
        if !self.current.contains_key(key) {
            return None;
        }
        let seq = self.seq + 1;
        Some(PendingCommit {
            seq,
            tx_id: TxId::derive(seq, key, &[]),
            timestamp,
            key: key.to_string(),
            value: Vec::new(),
            is_delete: true,
        })
    }

    /// Apply a commit: update the current value and extend history together.
    pub fn apply(&mut self, commit: PendingCommit) {
        if commit.is_delete {
            self.current.remove(&commit.key);
        } else {
            self.current.insert(commit.key.clone(), commit.value.clone());
        }
        self.seq = self.seq.max(commit.seq);
        self.history
            .entry(commit.key)
            .or_default()
            .push(KeyModification {
                tx_id: commit.tx_id,
                timestamp: commit.timestamp,
                value: commit.value,
                is_delete: commit.is_delete,
            });
    }

    /// Copy of the commit log for `key`, oldest first.
    pub fn history_of(&self, key: &str) -> Vec<KeyModification> {
        self.history.get(key).cloned().unwrap_or_default()
    }
}

/// Cursor over a copied commit log.
///
/// Increments the shared open-cursor counter on creation and decrements it
/// on drop. When `fail_after` is set, the cursor yields that many rows and
/// then reports the ledger as unavailable.
pub(crate) struct SnapshotCursor {
    rows: std::vec::IntoIter<KeyModification>,
    yielded: usize,
    fail_after: Option<usize>,
    failed: bool,
    open: Arc<AtomicUsize>,
}

impl SnapshotCursor {
    pub fn new(rows: Vec<KeyModification>, open: Arc<AtomicUsize>) -> Self {
        open.fetch_add(1, Ordering::SeqCst);
        Self {
            rows: rows.into_iter(),
            yielded: 0,
            fail_after: None,
            failed: false,
            open,
        }
    }

    pub fn fail_after(mut self, rows: Option<usize>) -> Self {
        self.fail_after = rows;
        self
    }
}

impl Iterator for SnapshotCursor {
    type Item = StateResult<KeyModification>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        if self.fail_after.is_some_and(|limit| self.yielded >= limit) {
            self.failed = true;
            return Some(Err(StateError::Unavailable(
                "history cursor interrupted".into(),
            )));
        }
        let row = self.rows.next()?;
        self.yielded += 1;
        Some(Ok(row))
    }
}

impl Drop for SnapshotCursor {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}
