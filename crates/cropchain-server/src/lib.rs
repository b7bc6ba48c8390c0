//! HTTP server for CropChain.
//!
//! Exposes the product custody contract as a small JSON REST API. Contract
//! errors map onto HTTP statuses, with an `{"error": message}` body.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::{CreateProductRequest, ExistsResponse, TransferRequest};
pub use server::CropchainServer;
