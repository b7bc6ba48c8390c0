use std::sync::Arc;

use cropchain_state::BackingLedger;
use cropchain_types::{Clock, CustodyEvent, HistoryEntry, Product, ProductId, SystemClock};
use tracing::{debug, warn};

use crate::error::ContractResult;
use crate::history::HistoryLedger;
use crate::projection::CustodyTrail;
use crate::store::{RecordStore, TransferReceipt};
use crate::validation::{TrailValidator, ValidationReport};

/// Product custody contract over a backing ledger.
///
/// Every entry point runs inside one [`BackingLedger::transact`] scope, so a
/// read-check-then-write sequence such as "create unless present" cannot
/// interleave with another call on the same ledger.
pub struct ProductContract<L> {
    ledger: Arc<L>,
    clock: Arc<dyn Clock>,
}

impl<L: BackingLedger> ProductContract<L> {
    /// Contract stamping records with the system clock.
    pub fn new(ledger: Arc<L>) -> Self {
        Self::with_clock(ledger, Arc::new(SystemClock))
    }

    pub fn with_clock(ledger: Arc<L>, clock: Arc<dyn Clock>) -> Self {
        Self { ledger, clock }
    }

    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    /// Lazy history view, outside any transaction scope.
    pub fn history(&self) -> HistoryLedger<'_, L> {
        HistoryLedger::new(self.ledger.as_ref())
    }

    fn store(&self) -> RecordStore<'_, L> {
        RecordStore::new(self.ledger.as_ref(), self.clock.as_ref())
    }

    fn atomically<T>(&self, op: impl FnOnce() -> ContractResult<T>) -> ContractResult<T> {
        self.ledger.transact(op)?
    }

    pub fn create_product(
        &self,
        id: impl Into<ProductId>,
        product_type: &str,
        farmer: &str,
        market_price_hash: &str,
        certification_ipfs_hash: &str,
    ) -> ContractResult<Product> {
        let id = id.into();
        self.atomically(|| {
            self.store()
                .create(id, product_type, farmer, market_price_hash, certification_ipfs_hash)
        })
    }

    /// Hand the product to a carrier.
    pub fn ship_product(&self, id: &ProductId, new_owner: &str) -> ContractResult<TransferReceipt> {
        self.atomically(|| {
            self.store()
                .transfer_custody(id, new_owner, CustodyEvent::Shipped)
        })
    }

    /// Record that `new_owner` took delivery.
    pub fn receive_product(
        &self,
        id: &ProductId,
        new_owner: &str,
    ) -> ContractResult<TransferReceipt> {
        self.atomically(|| {
            self.store()
                .transfer_custody(id, new_owner, CustodyEvent::Received)
        })
    }

    pub fn read_product(&self, id: &ProductId) -> ContractResult<Product> {
        self.atomically(|| self.store().read(id))
    }

    pub fn product_exists(&self, id: &ProductId) -> ContractResult<bool> {
        self.atomically(|| self.store().exists(id))
    }

    /// Full replayed history of `id`, oldest first.
    pub fn product_history(&self, id: &ProductId) -> ContractResult<Vec<HistoryEntry>> {
        self.atomically(|| self.history().collect(id))
    }

    pub fn custody_trail(&self, id: &ProductId) -> ContractResult<CustodyTrail> {
        let history = self.product_history(id)?;
        Ok(CustodyTrail::build(id, &history))
    }

    /// Replay `id` and check its history for integrity violations.
    pub fn verify_product(&self, id: &ProductId) -> ContractResult<ValidationReport> {
        let history = self.product_history(id)?;
        let report = TrailValidator::validate(id, &history);
        if report.is_valid() {
            debug!(id = %id, entries = report.entry_count, "custody trail verified");
        } else {
            warn!(
                id = %id,
                entries = report.entry_count,
                violations = report.violations.len(),
                "custody trail has violations"
            );
        }
        Ok(report)
    }
}

impl<L> Clone for ProductContract<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            clock: Arc::clone(&self.clock),
        }
    }
}
