//! Virtual Wall HTTP Client
//!
//! A small, type-safe client for the wall API, shared by the CLI and by
//! anything else that wants to talk to a deployed wall.
//!
//! # Example
//!
//! ```no_run
//! use wall_client::WallClient;
//!
//! #[tokio::main]
//! async fn main() -> wall_client::Result<()> {
//!     let client = WallClient::new("http://localhost:8080");
//!
//!     let wall = client.create_wall("kitchen").await?;
//!     println!("Created wall {} with {} objects", wall.wall_id, wall.count);
//!     Ok(())
//! }
//! ```

pub mod error;
mod walls;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use wall_core::dto::wall::WallSummary;

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

/// HTTP client for the wall API
#[derive(Debug, Clone)]
pub struct WallClient {
    /// Base URL of the site (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl WallClient {
    /// Create a new wall client
    ///
    /// # Example
    /// ```
    /// use wall_client::WallClient;
    ///
    /// let client = WallClient::new("http://localhost:8080");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new wall client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the site
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build an endpoint URL from raw path segments
    ///
    /// Segments are percent-encoded, so wall ids may contain spaces and
    /// other reserved characters.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| ClientError::InvalidUrl(format!("{}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::debug!("API error {}: {}", status, error_text);
            return Err(ClientError::api_error(status.as_u16(), error_message(&error_text)));
        }

        Ok(response.json().await?)
    }
}

/// Error bodies are JSON strings; anything else is shown as-is
fn error_message(body: &str) -> String {
    serde_json::from_str::<String>(body).unwrap_or_else(|_| body.to_string())
}
