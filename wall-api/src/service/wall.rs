//! Wall Service
//!
//! Business logic for wall creation, reads and content replacement.

use serde_json::Value;
use wall_core::domain::wall::{Wall, WallId, WallIdError};
use wall_core::dto::wall::WallSummary;

use crate::repository::{StoreError, WallStore};

/// Service error type
#[derive(Debug)]
pub enum WallError {
    InvalidId(WallIdError),
    NotFound(WallId),
    AlreadyExists(WallId),
    Store(StoreError),
}

impl From<StoreError> for WallError {
    fn from(err: StoreError) -> Self {
        WallError::Store(err)
    }
}

impl From<WallIdError> for WallError {
    fn from(err: WallIdError) -> Self {
        WallError::InvalidId(err)
    }
}

pub type Result<T> = std::result::Result<T, WallError>;

/// Create a wall with empty content
///
/// An existing id is rejected rather than overwritten.
pub async fn create_wall(store: &dyn WallStore, raw_id: &str) -> Result<Wall> {
    let id = WallId::parse(raw_id)?;
    let wall = Wall::new(id, chrono::Utc::now());

    if !store.insert(&wall).await? {
        return Err(WallError::AlreadyExists(wall.wall_id));
    }

    tracing::info!("Wall created: {}", wall.wall_id);

    Ok(wall)
}

/// Get a wall by ID
pub async fn get_wall(store: &dyn WallStore, raw_id: &str) -> Result<Wall> {
    let id = WallId::parse(raw_id)?;
    store.find(&id).await?.ok_or(WallError::NotFound(id))
}

pub async fn get_wall_count(store: &dyn WallStore, raw_id: &str) -> Result<WallSummary> {
    Ok(get_wall(store, raw_id).await?.summary())
}

pub async fn get_wall_content(store: &dyn WallStore, raw_id: &str) -> Result<Value> {
    Ok(get_wall(store, raw_id).await?.content)
}

/// Replace a wall's content wholesale
///
/// No merge and no version check: concurrent writers race, last write wins.
pub async fn put_wall_content(store: &dyn WallStore, raw_id: &str, content: Value) -> Result<Wall> {
    let id = WallId::parse(raw_id)?;

    let wall = store
        .replace_content(&id, content, chrono::Utc::now())
        .await?
        .ok_or(WallError::NotFound(id))?;

    tracing::info!("Wall content replaced: {} ({} objects)", wall.wall_id, wall.count);

    Ok(wall)
}
