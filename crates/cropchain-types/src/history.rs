use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::product::Product;
use crate::txid::TxId;

/// One row of a key's native commit log, as reported by the backing ledger.
///
/// `value` is empty when the row is a deletion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyModification {
    pub tx_id: TxId,
    pub timestamp: DateTime<Utc>,
    pub value: Vec<u8>,
    pub is_delete: bool,
}

impl KeyModification {
    /// Returns `true` if this row carries no record bytes.
    pub fn is_tombstone(&self) -> bool {
        self.is_delete || self.value.is_empty()
    }
}

/// A replayed history row: the product snapshot at that commit, or a
/// placeholder carrying only the identifier when the row is a tombstone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub record: Product,
    #[serde(rename = "txId")]
    pub tx_id: TxId,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "isDelete")]
    pub is_delete: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::ProductId;
    use chrono::TimeZone;

    #[test]
    fn empty_value_is_tombstone() {
        let m = KeyModification {
            tx_id: TxId::from_hash([1; 32]),
            timestamp: Utc.timestamp_opt(10, 0).unwrap(),
            value: vec![],
            is_delete: false,
        };
        assert!(m.is_tombstone());
    }

    #[test]
    fn delete_flag_is_tombstone() {
        let m = KeyModification {
            tx_id: TxId::from_hash([1; 32]),
            timestamp: Utc.timestamp_opt(10, 0).unwrap(),
            value: b"{}".to_vec(),
            is_delete: true,
        };
        assert!(m.is_tombstone());
    }

    #[test]
    fn history_entry_wire_names() {
        let entry = HistoryEntry {
            record: Product::placeholder(ProductId::from("P1")),
            tx_id: TxId::from_hash([2; 32]),
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            is_delete: true,
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["isDelete"], serde_json::Value::Bool(true));
        assert_eq!(value["txId"].as_str().unwrap().len(), 64);
        assert_eq!(value["record"]["ID"], "P1");
        assert_eq!(value["timestamp"], "2023-11-14T22:13:20Z");
    }
}
