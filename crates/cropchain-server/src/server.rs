use cropchain_ledger::ProductContract;
use cropchain_state::BackingLedger;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;

/// CropChain REST server over one product contract.
pub struct CropchainServer<L> {
    config: ServerConfig,
    contract: ProductContract<L>,
}

impl<L: BackingLedger + 'static> CropchainServer<L> {
    pub fn new(config: ServerConfig, contract: ProductContract<L>) -> Self {
        Self { config, contract }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.contract.clone())
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "cropchain server listening");
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
