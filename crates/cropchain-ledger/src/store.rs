use cropchain_state::BackingLedger;
use cropchain_types::{codec, Clock, CustodyEvent, Product, ProductId};
use serde::Serialize;
use tracing::info;

use crate::error::{ContractError, ContractResult};

/// Outcome of a custody transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReceipt {
    pub event: CustodyEvent,
    pub previous_owner: String,
    pub product: Product,
}

/// Current-snapshot view over a backing ledger.
///
/// Each product lives under its identifier as a strictly encoded JSON
/// record. Writes go through [`BackingLedger::put_state`], which also extends
/// the key's history.
pub struct RecordStore<'a, L> {
    ledger: &'a L,
    clock: &'a dyn Clock,
}

impl<'a, L: BackingLedger> RecordStore<'a, L> {
    pub fn new(ledger: &'a L, clock: &'a dyn Clock) -> Self {
        Self { ledger, clock }
    }

    /// Returns `true` if a current snapshot is present for `id`.
    pub fn exists(&self, id: &ProductId) -> ContractResult<bool> {
        Ok(self.ledger.get_state(id.as_str())?.is_some())
    }

    /// Issue a new product. The producer becomes its first holder.
    pub fn create(
        &self,
        id: ProductId,
        product_type: &str,
        farmer: &str,
        market_price_hash: &str,
        certification_ipfs_hash: &str,
    ) -> ContractResult<Product> {
        if self.exists(&id)? {
            return Err(ContractError::AlreadyExists(id));
        }

        let product = Product::issue(
            id,
            product_type,
            farmer,
            market_price_hash,
            certification_ipfs_hash,
            self.clock.now_secs(),
        );
        self.persist(&product)?;

        info!(id = %product.id, owner = %product.owner, kind = %product.product_type, "product created");
        Ok(product)
    }

    /// Current snapshot of `id`.
    pub fn read(&self, id: &ProductId) -> ContractResult<Product> {
        let bytes = self
            .ledger
            .get_state(id.as_str())?
            .ok_or_else(|| ContractError::NotFound(id.clone()))?;

        codec::decode(&bytes).map_err(|e| ContractError::Corrupt {
            id: id.clone(),
            reason: e.to_string(),
        })
    }

    /// Hand `id` to `new_owner`.
    ///
    /// Shipping and receiving both land here; `event` is recorded in logs and
    /// on the receipt only. `new_owner` is not validated.
    pub fn transfer_custody(
        &self,
        id: &ProductId,
        new_owner: &str,
        event: CustodyEvent,
    ) -> ContractResult<TransferReceipt> {
        let current = self.read(id)?;
        let product = current.transferred(new_owner, self.clock.now_secs());
        self.persist(&product)?;

        info!(
            id = %id,
            from = %current.owner,
            owner = %product.owner,
            event = %event,
            "custody transferred"
        );
        Ok(TransferReceipt {
            event,
            previous_owner: current.owner,
            product,
        })
    }

    fn persist(&self, product: &Product) -> ContractResult<()> {
        let bytes = codec::encode(product).map_err(|e| ContractError::Corrupt {
            id: product.id.clone(),
            reason: e.to_string(),
        })?;
        self.ledger.put_state(product.id.as_str(), &bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cropchain_state::{InMemoryLedger, StateError};
    use cropchain_types::ManualClock;
    use std::sync::Arc;

    fn fixture() -> (Arc<ManualClock>, InMemoryLedger) {
        let clock = Arc::new(ManualClock::new(1_700_000_000));
        let ledger = InMemoryLedger::with_clock(clock.clone());
        (clock, ledger)
    }

    fn create_p1<L: BackingLedger>(store: &RecordStore<'_, L>) -> Product {
        store
            .create("P1".into(), "grain", "farmerA", "priceHash1", "certHash1")
            .unwrap()
    }

    #[test]
    fn exists_is_false_for_unknown_id() {
        let (clock, ledger) = fixture();
        let store = RecordStore::new(&ledger, clock.as_ref());
        assert!(!store.exists(&"nope".into()).unwrap());
    }

    #[test]
    fn create_sets_producer_as_holder() {
        let (clock, ledger) = fixture();
        let store = RecordStore::new(&ledger, clock.as_ref());
        let product = create_p1(&store);

        assert_eq!(product.owner, "farmerA");
        assert_eq!(product.farmer, "farmerA");
        assert_eq!(product.timestamp, 1_700_000_000);
        assert!(store.exists(&"P1".into()).unwrap());
        assert_eq!(store.read(&"P1".into()).unwrap(), product);
    }

    #[test]
    fn create_twice_fails_and_leaves_state_alone() {
        let (clock, ledger) = fixture();
        let store = RecordStore::new(&ledger, clock.as_ref());
        let first = create_p1(&store);
        clock.advance(10);

        let err = store
            .create("P1".into(), "rice", "farmerZ", "p", "c")
            .unwrap_err();
        assert!(matches!(err, ContractError::AlreadyExists(id) if id.as_str() == "P1"));
        assert_eq!(store.read(&"P1".into()).unwrap(), first);
        assert_eq!(ledger.last_seq(), 1);
    }

    #[test]
    fn read_missing_is_not_found() {
        let (clock, ledger) = fixture();
        let store = RecordStore::new(&ledger, clock.as_ref());
        let err = store.read(&"ghost".into()).unwrap_err();
        assert!(matches!(err, ContractError::NotFound(_)));
    }

    #[test]
    fn read_garbage_is_corrupt() {
        let (clock, ledger) = fixture();
        ledger.put_state("P1", b"{not json").unwrap();
        let store = RecordStore::new(&ledger, clock.as_ref());
        let err = store.read(&"P1".into()).unwrap_err();
        assert!(matches!(err, ContractError::Corrupt { .. }));
    }

    #[test]
    fn read_missing_field_is_corrupt() {
        let (clock, ledger) = fixture();
        ledger
            .put_state("P1", br#"{"ID":"P1","type":"grain","farmer":"f","owner":"f","timestamp":1}"#)
            .unwrap();
        let store = RecordStore::new(&ledger, clock.as_ref());
        assert!(matches!(
            store.read(&"P1".into()),
            Err(ContractError::Corrupt { .. })
        ));
    }

    #[test]
    fn transfer_replaces_holder_and_advances_time() {
        let (clock, ledger) = fixture();
        let store = RecordStore::new(&ledger, clock.as_ref());
        create_p1(&store);
        clock.advance(60);

        let receipt = store
            .transfer_custody(&"P1".into(), "shipperB", CustodyEvent::Shipped)
            .unwrap();
        assert_eq!(receipt.previous_owner, "farmerA");
        assert_eq!(receipt.event, CustodyEvent::Shipped);
        assert_eq!(receipt.product.owner, "shipperB");
        assert_eq!(receipt.product.farmer, "farmerA");
        assert_eq!(receipt.product.timestamp, 1_700_000_060);
        assert_eq!(store.read(&"P1".into()).unwrap(), receipt.product);
    }

    #[test]
    fn ship_and_receive_persist_the_same_shape() {
        let (clock, ledger) = fixture();
        let store = RecordStore::new(&ledger, clock.as_ref());
        create_p1(&store);

        let shipped = store
            .transfer_custody(&"P1".into(), "X", CustodyEvent::Shipped)
            .unwrap()
            .product;
        let received = store
            .transfer_custody(&"P1".into(), "X", CustodyEvent::Received)
            .unwrap()
            .product;
        assert_eq!(shipped, received);
    }

    #[test]
    fn transfer_with_backwards_clock_keeps_timestamp() {
        let (clock, ledger) = fixture();
        let store = RecordStore::new(&ledger, clock.as_ref());
        create_p1(&store);
        clock.set(1_600_000_000);

        let product = store
            .transfer_custody(&"P1".into(), "shipperB", CustodyEvent::Shipped)
            .unwrap()
            .product;
        assert_eq!(product.timestamp, 1_700_000_000);
    }

    #[test]
    fn transfer_accepts_empty_holder() {
        let (clock, ledger) = fixture();
        let store = RecordStore::new(&ledger, clock.as_ref());
        create_p1(&store);
        let product = store
            .transfer_custody(&"P1".into(), "", CustodyEvent::Received)
            .unwrap()
            .product;
        assert_eq!(product.owner, "");
        assert_eq!(store.read(&"P1".into()).unwrap().owner, "");
    }

    #[test]
    fn transfer_missing_is_not_found_and_writes_nothing() {
        let (clock, ledger) = fixture();
        let store = RecordStore::new(&ledger, clock.as_ref());
        let err = store
            .transfer_custody(&"ghost".into(), "shipperB", CustodyEvent::Shipped)
            .unwrap_err();
        assert!(matches!(err, ContractError::NotFound(_)));
        assert!(ledger.read_history("ghost").unwrap().is_empty());
    }

    #[test]
    fn unavailable_ledger_surfaces_storage_error() {
        let (clock, ledger) = fixture();
        ledger.set_unavailable(true).unwrap();
        let store = RecordStore::new(&ledger, clock.as_ref());

        assert!(matches!(
            store.exists(&"P1".into()),
            Err(ContractError::StorageUnavailable(StateError::Unavailable(_)))
        ));
        assert!(matches!(
            store.create("P1".into(), "grain", "f", "p", "c"),
            Err(ContractError::StorageUnavailable(_))
        ));
        assert!(matches!(
            store.read(&"P1".into()),
            Err(ContractError::StorageUnavailable(_))
        ));
    }
}
