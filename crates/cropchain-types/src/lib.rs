//! Foundation types for CropChain.
//!
//! This crate provides the record, history, and temporal types shared by the
//! state backends, the product ledger, and the adapters. Every other
//! CropChain crate depends on `cropchain-types`.
//!
//! # Key Types
//!
//! - [`ProductId`] -- Unique key naming one tracked product instance
//! - [`Product`] -- The current snapshot of a product (the record)
//! - [`TxId`] -- Ledger-assigned transaction identifier
//! - [`KeyModification`] -- One row of a key's native commit log
//! - [`HistoryEntry`] -- A replayed snapshot (or tombstone) with its commit metadata
//! - [`CustodyEvent`] -- Direction tag carried by a custody transfer
//! - [`Clock`] -- Injected source of "now"

pub mod codec;
pub mod custody;
pub mod error;
pub mod history;
pub mod product;
pub mod temporal;
pub mod txid;

pub use custody::CustodyEvent;
pub use error::TypeError;
pub use history::{HistoryEntry, KeyModification};
pub use product::{Product, ProductId};
pub use temporal::{Clock, ManualClock, SystemClock};
pub use txid::TxId;
