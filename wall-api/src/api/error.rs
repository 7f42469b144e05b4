//! API Error Handling
//!
//! Every failure becomes an [`ApiResponse`] with a JSON string body; nothing
//! escapes the dispatch boundary as a server fault.

use std::time::Duration;
use wall_core::dto::api::ApiResponse;

use crate::repository::StoreError;
use crate::service::wall_service::WallError;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    PayloadTooLarge(String),
    /// Storage failures carry their diagnostic text back to the caller
    StorageError(StoreError),
    Timeout(Duration),
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) | ApiError::StorageError(_) => 400,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::PayloadTooLarge(_) => 413,
            ApiError::Timeout(_) => 504,
        }
    }

    pub fn into_response(self) -> ApiResponse {
        let status = self.status_code();
        let message = match self {
            ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::PayloadTooLarge(msg) => msg,
            ApiError::StorageError(err) => {
                tracing::error!("Storage error: {:?}", err);
                format!("Storage error: {err}")
            }
            ApiError::Timeout(limit) => {
                tracing::error!("Invocation timed out after {:?}", limit);
                format!("Request timed out after {limit:?}")
            }
        };

        ApiResponse::error(status, &message)
    }
}

impl From<WallError> for ApiError {
    fn from(err: WallError) -> Self {
        match err {
            WallError::InvalidId(e) => ApiError::BadRequest(format!("Invalid wall id: {e}")),
            WallError::NotFound(id) => ApiError::NotFound(format!("Wall {id} not found")),
            WallError::AlreadyExists(id) => ApiError::Conflict(format!("Wall {id} already exists")),
            WallError::Store(e) => ApiError::StorageError(e),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::StorageError(err)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
