/// Errors from backing-ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// The ledger could not be reached or refused the operation.
    #[error("backing ledger unavailable: {0}")]
    Unavailable(String),

    /// I/O error from the underlying journal.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failure of a journal frame.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A journal frame before the tail failed its checksum or could not be decoded.
    #[error("corrupt journal at offset {offset}: {reason}")]
    CorruptJournal { offset: u64, reason: String },

    /// An internal lock was poisoned by a panicking writer.
    #[error("ledger lock poisoned")]
    LockPoisoned,
}

/// Result alias for backing-ledger operations.
pub type StateResult<T> = Result<T, StateError>;
