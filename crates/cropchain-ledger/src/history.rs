use cropchain_state::{BackingLedger, HistoryCursor};
use cropchain_types::{codec, HistoryEntry, KeyModification, Product, ProductId};

use crate::error::{ContractError, ContractResult};

/// Replay view over a product's commit log.
pub struct HistoryLedger<'a, L> {
    ledger: &'a L,
}

impl<'a, L: BackingLedger> HistoryLedger<'a, L> {
    pub fn new(ledger: &'a L) -> Self {
        Self { ledger }
    }

    /// Lazily replay the history of `id`, oldest first.
    ///
    /// Every call opens a fresh ledger cursor; nothing is cached. An
    /// identifier that was never written yields an empty sequence.
    pub fn history_of(&self, id: &ProductId) -> ContractResult<HistoryIter<'a>> {
        let cursor = self.ledger.history_for_key(id.as_str())?;
        Ok(HistoryIter {
            id: id.clone(),
            cursor: Some(cursor),
        })
    }

    /// Replay the full history of `id`, stopping at the first failure.
    pub fn collect(&self, id: &ProductId) -> ContractResult<Vec<HistoryEntry>> {
        self.history_of(id)?.collect()
    }
}

/// Iterator over the replayed history of one product.
///
/// Owns the ledger cursor. The first error is yielded once and ends the
/// iteration; the cursor is released at that point, at exhaustion, or when
/// the iterator is dropped, whichever comes first.
pub struct HistoryIter<'a> {
    id: ProductId,
    cursor: Option<Box<dyn HistoryCursor + 'a>>,
}

impl HistoryIter<'_> {
    pub fn product_id(&self) -> &ProductId {
        &self.id
    }

    fn replay(&self, row: KeyModification) -> ContractResult<HistoryEntry> {
        let record = if row.is_tombstone() {
            Product::placeholder(self.id.clone())
        } else {
            codec::decode(&row.value).map_err(|e| ContractError::Corrupt {
                id: self.id.clone(),
                reason: format!("history entry {}: {e}", row.tx_id.short_hex()),
            })?
        };

        Ok(HistoryEntry {
            record,
            tx_id: row.tx_id,
            timestamp: row.timestamp,
            is_delete: row.is_delete,
        })
    }
}

impl Iterator for HistoryIter<'_> {
    type Item = ContractResult<HistoryEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor.as_mut()?;
        let item = match cursor.next() {
            None => {
                self.cursor = None;
                return None;
            }
            Some(Err(e)) => Err(ContractError::from(e)),
            Some(Ok(row)) => self.replay(row),
        };
        if item.is_err() {
            self.cursor = None;
        }
        Some(item)
    }
}

impl std::iter::FusedIterator for HistoryIter<'_> {}
