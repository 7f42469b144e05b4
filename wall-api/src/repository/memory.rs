//! In-memory wall store
//!
//! Backs the local environment and the tests. Records vanish with the process.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use wall_core::domain::wall::{Wall, WallId};

use super::{StoreResult, WallStore};

#[derive(Debug, Default)]
pub struct MemoryWallStore {
    walls: RwLock<HashMap<WallId, Wall>>,
}

impl MemoryWallStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.walls.read().await.len()
    }
}

#[async_trait]
impl WallStore for MemoryWallStore {
    async fn find(&self, id: &WallId) -> StoreResult<Option<Wall>> {
        Ok(self.walls.read().await.get(id).cloned())
    }

    async fn insert(&self, wall: &Wall) -> StoreResult<bool> {
        let mut walls = self.walls.write().await;
        if walls.contains_key(&wall.wall_id) {
            return Ok(false);
        }
        walls.insert(wall.wall_id.clone(), wall.clone());
        Ok(true)
    }

    async fn replace_content(
        &self,
        id: &WallId,
        content: Value,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<Option<Wall>> {
        let mut walls = self.walls.write().await;
        Ok(walls.get_mut(id).map(|wall| {
            wall.replace_content(content, updated_at);
            wall.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn id(raw: &str) -> WallId {
        WallId::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn test_insert_rejects_existing_id() {
        let store = MemoryWallStore::new();
        let wall = Wall::new(id("kitchen"), Utc::now());

        assert!(store.insert(&wall).await.unwrap());
        assert!(!store.insert(&wall).await.unwrap());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_replace_content_requires_existing_wall() {
        let store = MemoryWallStore::new();
        let result = store
            .replace_content(&id("ghost"), json!([]), Utc::now())
            .await
            .unwrap();

        assert!(result.is_none());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_replace_content_overwrites() {
        let store = MemoryWallStore::new();
        store.insert(&Wall::new(id("w"), Utc::now())).await.unwrap();

        let payload = json!({ "objects": [{ "type": "circle" }, { "type": "line" }] });
        let updated = store
            .replace_content(&id("w"), payload.clone(), Utc::now())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.count, 2);
        let found = store.find(&id("w")).await.unwrap().unwrap();
        assert_eq!(found.content, payload);
    }
}
