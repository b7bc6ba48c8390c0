use chrono::{DateTime, Utc};
use cropchain_types::{HistoryEntry, ProductId, TxId};
use serde::{Deserialize, Serialize};

/// One stretch of custody: `holder` held the product from `since` until the
/// next span began.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodySpan {
    pub holder: String,
    /// Record timestamp, seconds since the Unix epoch.
    pub since: i64,
    pub tx_id: TxId,
    /// Ledger commit time of the write that started this span.
    pub committed_at: DateTime<Utc>,
}

/// Custody projection rebuilt from a product's replayed history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyTrail {
    pub id: ProductId,
    pub producer: Option<String>,
    pub spans: Vec<CustodySpan>,
    pub deleted: bool,
}

impl CustodyTrail {
    /// Fold `history` (oldest first) into holder spans.
    ///
    /// Consecutive entries with the same holder collapse into one span.
    /// A tombstone ends the current lifetime; a later write starts a new
    /// one, and its producer replaces the previous one.
    pub fn build(id: &ProductId, history: &[HistoryEntry]) -> Self {
        let mut spans: Vec<CustodySpan> = Vec::new();
        let mut producer = None;
        let mut open = false;

        for entry in history {
            if entry.is_delete {
                open = false;
                continue;
            }
            let record = &entry.record;
            if !open {
                producer = Some(record.farmer.clone());
                open = true;
            } else if spans.last().is_some_and(|s| s.holder == record.owner) {
                continue;
            }
            spans.push(CustodySpan {
                holder: record.owner.clone(),
                since: record.timestamp,
                tx_id: entry.tx_id,
                committed_at: entry.timestamp,
            });
        }

        Self {
            id: id.clone(),
            producer,
            spans,
            deleted: history.last().is_some_and(|e| e.is_delete),
        }
    }

    /// Holder of the live record, or `None` if there is none.
    pub fn current_holder(&self) -> Option<&str> {
        if self.deleted {
            return None;
        }
        self.spans.last().map(|s| s.holder.as_str())
    }

    /// Holders in custody order.
    pub fn holders(&self) -> Vec<&str> {
        self.spans.iter().map(|s| s.holder.as_str()).collect()
    }

    /// Number of hand-overs recorded after the first span.
    pub fn transfer_count(&self) -> usize {
        self.spans.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use cropchain_types::Product;

    fn entry(seq: u8, owner: &str, ts: i64) -> HistoryEntry {
        let mut record = Product::issue("P1".into(), "grain", "farmerA", "p", "c", ts);
        record.owner = owner.to_string();
        HistoryEntry {
            record,
            tx_id: TxId::from_hash([seq; 32]),
            timestamp: Utc.timestamp_opt(ts, 0).unwrap(),
            is_delete: false,
        }
    }

    fn tombstone(seq: u8, ts: i64) -> HistoryEntry {
        HistoryEntry {
            record: Product::placeholder("P1".into()),
            tx_id: TxId::from_hash([seq; 32]),
            timestamp: Utc.timestamp_opt(ts, 0).unwrap(),
            is_delete: true,
        }
    }

    #[test]
    fn empty_history_has_no_holder() {
        let trail = CustodyTrail::build(&"P1".into(), &[]);
        assert!(trail.is_empty());
        assert_eq!(trail.current_holder(), None);
        assert_eq!(trail.producer, None);
        assert_eq!(trail.transfer_count(), 0);
    }

    #[test]
    fn spans_follow_holders() {
        let history = vec![
            entry(1, "farmerA", 100),
            entry(2, "shipperB", 110),
            entry(3, "retailerC", 120),
        ];
        let trail = CustodyTrail::build(&"P1".into(), &history);
        assert_eq!(trail.holders(), vec!["farmerA", "shipperB", "retailerC"]);
        assert_eq!(trail.current_holder(), Some("retailerC"));
        assert_eq!(trail.producer.as_deref(), Some("farmerA"));
        assert_eq!(trail.transfer_count(), 2);
        assert_eq!(trail.spans[1].since, 110);
        assert_eq!(trail.spans[1].tx_id, TxId::from_hash([2; 32]));
    }

    #[test]
    fn repeated_holder_collapses() {
        let history = vec![
            entry(1, "farmerA", 100),
            entry(2, "shipperB", 110),
            entry(3, "shipperB", 115),
        ];
        let trail = CustodyTrail::build(&"P1".into(), &history);
        assert_eq!(trail.holders(), vec!["farmerA", "shipperB"]);
        assert_eq!(trail.spans[1].since, 110);
    }

    #[test]
    fn tombstone_clears_current_holder() {
        let history = vec![entry(1, "farmerA", 100), tombstone(2, 105)];
        let trail = CustodyTrail::build(&"P1".into(), &history);
        assert!(trail.deleted);
        assert_eq!(trail.current_holder(), None);
        assert_eq!(trail.holders(), vec!["farmerA"]);
    }

    #[test]
    fn recreation_after_tombstone_starts_new_span() {
        let mut reborn = entry(3, "farmerA", 200);
        reborn.record.farmer = "farmerZ".into();
        reborn.record.owner = "farmerZ".into();
        let history = vec![entry(1, "farmerA", 100), tombstone(2, 105), reborn];

        let trail = CustodyTrail::build(&"P1".into(), &history);
        assert!(!trail.deleted);
        assert_eq!(trail.holders(), vec!["farmerA", "farmerZ"]);
        assert_eq!(trail.producer.as_deref(), Some("farmerZ"));
        assert_eq!(trail.current_holder(), Some("farmerZ"));
    }
}
