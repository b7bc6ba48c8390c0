use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use cropchain_ledger::ContractError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Contract(ContractError::AlreadyExists(_)) => StatusCode::CONFLICT,
            Self::Contract(ContractError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Contract(ContractError::StorageUnavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Contract(ContractError::Corrupt { .. })
            | Self::Io(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
