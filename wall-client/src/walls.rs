//! Wall API endpoints

use serde_json::Value;
use wall_core::dto::wall::WallSummary;

use crate::WallClient;
use crate::error::Result;

impl WallClient {
    // =============================================================================
    // Health
    // =============================================================================

    /// GET /api
    pub async fn health(&self) -> Result<String> {
        let url = self.url(&["api"])?;
        let response = self.client.get(url).send().await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Walls
    // =============================================================================

    /// Create a wall
    ///
    /// Fails with a 409 [`crate::ClientError::ApiError`] if the id is taken.
    pub async fn create_wall(&self, wall_id: &str) -> Result<WallSummary> {
        let url = self.url(&["api", "wall", wall_id])?;
        let response = self.client.post(url).send().await?;

        self.handle_response(response).await
    }

    /// Get the object count of a wall
    pub async fn get_wall_count(&self, wall_id: &str) -> Result<WallSummary> {
        let url = self.url(&["api", "wall", wall_id])?;
        let response = self.client.get(url).send().await?;

        self.handle_response(response).await
    }

    /// Get the stored content of a wall, verbatim
    pub async fn get_wall_content(&self, wall_id: &str) -> Result<Value> {
        let url = self.url(&["api", "wall", wall_id, "content"])?;
        let response = self.client.get(url).send().await?;

        self.handle_response(response).await
    }

    /// Replace the content of a wall
    pub async fn put_wall_content(&self, wall_id: &str, content: &Value) -> Result<WallSummary> {
        let url = self.url(&["api", "wall", wall_id, "content"])?;
        let response = self.client.put(url).json(content).send().await?;

        self.handle_response(response).await
    }
}
