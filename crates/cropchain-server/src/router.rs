use axum::routing::{get, post};
use axum::Router;
use cropchain_ledger::ProductContract;
use cropchain_state::BackingLedger;
use tower_http::trace::TraceLayer;

use crate::handler;

/// Build the axum router with all CropChain endpoints.
pub fn build_router<L: BackingLedger + 'static>(contract: ProductContract<L>) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/api/products", post(handler::create_product::<L>))
        .route("/api/products/:id", get(handler::read_product::<L>))
        .route("/api/products/:id/exists", get(handler::product_exists::<L>))
        .route("/api/products/:id/history", get(handler::product_history::<L>))
        .route("/api/products/:id/trail", get(handler::custody_trail::<L>))
        .route("/api/products/:id/verify", get(handler::verify_product::<L>))
        .route("/api/products/:id/ship", post(handler::ship_product::<L>))
        .route("/api/products/:id/receive", post(handler::receive_product::<L>))
        .layer(TraceLayer::new_for_http())
        .with_state(contract)
}
