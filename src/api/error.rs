use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::blockchain::ClientError;
use crate::db::StoreError;
use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid address: {0:?}")]
    InvalidAddress(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Upstream error: {0}")]
    Upstream(#[from] ClientError),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::InvalidAddress(_) => (StatusCode::BAD_REQUEST, "Invalid address".to_string()),
            ApiError::InvalidParameter(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Upstream(e) => {
                error!("Upstream request failed: {}", e);
                (StatusCode::BAD_GATEWAY, "Blockchain node unavailable".to_string())
            }
            ApiError::Storage(e) => {
                error!("Storage request failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error occurred".to_string())
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidAddress(address) => ApiError::InvalidAddress(address),
            other @ ValidationError::InvalidBlock { .. } => {
                ApiError::InvalidParameter(other.to_string())
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(e) => e.into(),
            other => ApiError::Storage(other.to_string()),
        }
    }
}
