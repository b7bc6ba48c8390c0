//! Product custody ledger for CropChain.
//!
//! This crate is the heart of CropChain. It provides:
//! - `RecordStore`: current product snapshots under their identifiers
//! - `HistoryLedger`: lazy, fail-fast replay of a product's commit log
//! - `CustodyTrail` projection and `TrailValidator` integrity checks
//! - `ProductContract`: the transactional entry points used by the server
//!   and the CLI
//!
//! Storage is reached only through [`cropchain_state::BackingLedger`].

pub mod contract;
pub mod error;
pub mod history;
pub mod projection;
pub mod store;
pub mod validation;

pub use contract::ProductContract;
pub use error::{ContractError, ContractResult};
pub use history::{HistoryIter, HistoryLedger};
pub use projection::{CustodySpan, CustodyTrail};
pub use store::{RecordStore, TransferReceipt};
pub use validation::{TrailValidator, ValidationReport, Violation, ViolationKind};
