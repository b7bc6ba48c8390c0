use cropchain_types::{HistoryEntry, ProductId, TxId};
use serde::{Deserialize, Serialize};

/// Result of checking one product's history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub id: ProductId,
    pub entry_count: usize,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A specific integrity violation detected during validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Position of the offending entry in the replayed history.
    pub index: usize,
    pub tx_id: TxId,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationKind {
    IdMismatch,
    TimestampRegression,
    ProducerChanged,
    CommitOrderRegression,
}

/// Custody-trail integrity validator.
pub struct TrailValidator;

impl TrailValidator {
    /// Check `history` (oldest first) against the custody rules for `id`.
    ///
    /// Record timestamps must not decrease and the producer must not change
    /// within one lifetime; a tombstone ends the lifetime. Ledger commit
    /// times must not decrease across the whole history.
    pub fn validate(id: &ProductId, history: &[HistoryEntry]) -> ValidationReport {
        let mut violations = Vec::new();
        let mut producer: Option<&str> = None;
        let mut last_record_ts: Option<i64> = None;
        let mut last_commit = None;

        for (index, entry) in history.iter().enumerate() {
            let mut flag = |kind, description: String| {
                violations.push(Violation {
                    index,
                    tx_id: entry.tx_id,
                    kind,
                    description,
                })
            };

            if let Some(prev) = last_commit {
                if entry.timestamp < prev {
                    flag(
                        ViolationKind::CommitOrderRegression,
                        format!("committed at {} before {prev}", entry.timestamp),
                    );
                }
            }
            last_commit = Some(entry.timestamp);

            let record = &entry.record;
            if record.id != *id {
                flag(
                    ViolationKind::IdMismatch,
                    format!("record id {} stored under {id}", record.id),
                );
            }

            if entry.is_delete {
                producer = None;
                last_record_ts = None;
                continue;
            }

            match producer {
                None => producer = Some(record.farmer.as_str()),
                Some(p) if p != record.farmer => flag(
                    ViolationKind::ProducerChanged,
                    format!("producer changed from {p} to {}", record.farmer),
                ),
                Some(_) => {}
            }

            if let Some(prev) = last_record_ts {
                if record.timestamp < prev {
                    flag(
                        ViolationKind::TimestampRegression,
                        format!("record timestamp {} is older than {prev}", record.timestamp),
                    );
                }
            }
            last_record_ts = Some(record.timestamp);
        }

        ValidationReport {
            id: id.clone(),
            entry_count: history.len(),
            violations,
        }
    }
}
