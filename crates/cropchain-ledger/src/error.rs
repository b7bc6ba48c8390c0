use cropchain_state::StateError;
use cropchain_types::ProductId;

/// Errors produced by product ledger operations.
///
/// Every operation either succeeds or returns exactly one of these kinds.
/// Nothing is retried or swallowed internally.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("the product {0} already exists")]
    AlreadyExists(ProductId),

    #[error("the product {0} does not exist")]
    NotFound(ProductId),

    #[error("product {id} is corrupt: {reason}")]
    Corrupt { id: ProductId, reason: String },

    #[error("failed to read from world state: {0}")]
    StorageUnavailable(#[from] StateError),
}

impl ContractError {
    /// Returns `true` if retrying the same call might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }
}

/// Result alias for product ledger operations.
pub type ContractResult<T> = Result<T, ContractError>;
