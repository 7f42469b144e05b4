//! Health Check Handler
//!
//! Answers without touching storage.

use wall_core::dto::api::ApiResponse;

pub fn health_check() -> ApiResponse {
    ApiResponse::json(200, "Alive")
}
