//! Backing-ledger capability for CropChain.
//!
//! The product ledger never talks to storage directly. It consumes the
//! [`BackingLedger`] trait: point reads and writes of current values, plus a
//! per-key commit log that the ledger extends as a side effect of every write.
//!
//! # Backends
//!
//! - [`InMemoryLedger`] -- `HashMap`-based ledger for tests and embedding,
//!   with switchable failure modes
//! - [`FileLedger`] -- durable ledger replaying a CRC-framed [`Journal`]
//!
//! # Design Rules
//!
//! 1. A write updates the current value and extends history atomically.
//! 2. History is returned in commit order, oldest first.
//! 3. Transaction ids are assigned by the ledger, never by callers.
//! 4. The ledger never interprets values; it is a pure key-value store.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod file;
pub mod journal;
pub mod memory;
pub mod traits;
mod world;

pub use error::{StateError, StateResult};
pub use file::FileLedger;
pub use journal::{Journal, JournalRecord, JournalSync};
pub use memory::InMemoryLedger;
pub use traits::{BackingLedger, HistoryCursor};
