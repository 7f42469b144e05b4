//! Repository Module
//!
//! Data access layer for walls. The service layer only sees the
//! [`WallStore`] trait; the backend is picked at startup.

pub mod memory;
pub mod wall;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use wall_core::domain::wall::{Wall, WallId};

pub use memory::MemoryWallStore;
pub use wall::PgWallStore;

/// Storage failure
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row no longer satisfies the wall invariants
    #[error("corrupt wall record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Get/put access to one record per wall id
///
/// No locking is implied: two writers of the same id race and the last one
/// wins.
#[async_trait]
pub trait WallStore: Send + Sync {
    /// Find a wall by id
    async fn find(&self, id: &WallId) -> StoreResult<Option<Wall>>;

    /// Insert a new wall; `false` if the id is already taken
    async fn insert(&self, wall: &Wall) -> StoreResult<bool>;

    /// Overwrite the content of an existing wall; `None` if it does not exist
    async fn replace_content(
        &self,
        id: &WallId,
        content: Value,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Option<Wall>>;
}
