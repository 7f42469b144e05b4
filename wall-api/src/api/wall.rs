//! Wall API Handlers
//!
//! One function per wall operation. Each returns the response on success and
//! leaves error conversion to the dispatch boundary.

use serde_json::Value;
use wall_core::dto::api::ApiResponse;

use crate::api::error::ApiResult;
use crate::repository::WallStore;
use crate::service::wall_service;

/// GET /api/wall/{wall_id}
pub async fn get_wall_count(store: &dyn WallStore, wall_id: &str) -> ApiResult<ApiResponse> {
    tracing::debug!("Getting wall count: {}", wall_id);

    let summary = wall_service::get_wall_count(store, wall_id).await?;

    Ok(ApiResponse::json(200, &summary))
}

/// POST /api/wall/{wall_id}
pub async fn create_wall(store: &dyn WallStore, wall_id: &str) -> ApiResult<ApiResponse> {
    tracing::info!("Creating wall: {}", wall_id);

    let wall = wall_service::create_wall(store, wall_id).await?;

    Ok(ApiResponse::json(201, &wall.summary()))
}

/// GET /api/wall/{wall_id}/content
pub async fn get_wall_content(store: &dyn WallStore, wall_id: &str) -> ApiResult<ApiResponse> {
    tracing::debug!("Getting wall content: {}", wall_id);

    let content = wall_service::get_wall_content(store, wall_id).await?;

    Ok(ApiResponse::json(200, &content))
}

/// PUT /api/wall/{wall_id}/content
pub async fn put_wall_content(
    store: &dyn WallStore,
    wall_id: &str,
    content: Value,
) -> ApiResult<ApiResponse> {
    tracing::info!("Replacing wall content: {}", wall_id);

    let wall = wall_service::put_wall_content(store, wall_id, content).await?;

    Ok(ApiResponse::json(200, &wall.summary()))
}
