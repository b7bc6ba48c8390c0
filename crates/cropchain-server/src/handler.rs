use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use cropchain_ledger::{
    ContractResult, CustodyTrail, ProductContract, TransferReceipt, ValidationReport,
};
use cropchain_state::BackingLedger;
use cropchain_types::{HistoryEntry, Product, ProductId};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{ServerError, ServerResult};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub id: String,
    #[serde(rename = "type")]
    pub product_type: String,
    pub farmer_name: String,
    pub market_price_hash: String,
    #[serde(default)]
    pub ipfs_hash: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub new_owner: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExistsResponse {
    pub exists: bool,
}

/// Run a ledger call off the async executor.
async fn blocking<L, T, F>(contract: ProductContract<L>, op: F) -> ServerResult<T>
where
    L: BackingLedger + 'static,
    T: Send + 'static,
    F: FnOnce(&ProductContract<L>) -> ContractResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || op(&contract))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?
        .map_err(ServerError::from)
}

pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "name": "cropchain-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn create_product<L: BackingLedger + 'static>(
    State(contract): State<ProductContract<L>>,
    Json(req): Json<CreateProductRequest>,
) -> ServerResult<(StatusCode, Json<Product>)> {
    let product = blocking(contract, move |c| {
        c.create_product(
            req.id,
            &req.product_type,
            &req.farmer_name,
            &req.market_price_hash,
            &req.ipfs_hash,
        )
    })
    .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn ship_product<L: BackingLedger + 'static>(
    State(contract): State<ProductContract<L>>,
    Path(id): Path<String>,
    Json(req): Json<TransferRequest>,
) -> ServerResult<Json<TransferReceipt>> {
    let id = ProductId::new(id);
    blocking(contract, move |c| c.ship_product(&id, &req.new_owner))
        .await
        .map(Json)
}

pub async fn receive_product<L: BackingLedger + 'static>(
    State(contract): State<ProductContract<L>>,
    Path(id): Path<String>,
    Json(req): Json<TransferRequest>,
) -> ServerResult<Json<TransferReceipt>> {
    let id = ProductId::new(id);
    blocking(contract, move |c| c.receive_product(&id, &req.new_owner))
        .await
        .map(Json)
}

pub async fn read_product<L: BackingLedger + 'static>(
    State(contract): State<ProductContract<L>>,
    Path(id): Path<String>,
) -> ServerResult<Json<Product>> {
    let id = ProductId::new(id);
    blocking(contract, move |c| c.read_product(&id)).await.map(Json)
}

pub async fn product_exists<L: BackingLedger + 'static>(
    State(contract): State<ProductContract<L>>,
    Path(id): Path<String>,
) -> ServerResult<Json<ExistsResponse>> {
    let id = ProductId::new(id);
    let exists = blocking(contract, move |c| c.product_exists(&id)).await?;
    Ok(Json(ExistsResponse { exists }))
}

pub async fn product_history<L: BackingLedger + 'static>(
    State(contract): State<ProductContract<L>>,
    Path(id): Path<String>,
) -> ServerResult<Json<Vec<HistoryEntry>>> {
    let id = ProductId::new(id);
    blocking(contract, move |c| c.product_history(&id))
        .await
        .map(Json)
}

pub async fn custody_trail<L: BackingLedger + 'static>(
    State(contract): State<ProductContract<L>>,
    Path(id): Path<String>,
) -> ServerResult<Json<CustodyTrail>> {
    let id = ProductId::new(id);
    blocking(contract, move |c| c.custody_trail(&id))
        .await
        .map(Json)
}

pub async fn verify_product<L: BackingLedger + 'static>(
    State(contract): State<ProductContract<L>>,
    Path(id): Path<String>,
) -> ServerResult<Json<ValidationReport>> {
    let id = ProductId::new(id);
    blocking(contract, move |c| c.verify_product(&id))
        .await
        .map(Json)
}
