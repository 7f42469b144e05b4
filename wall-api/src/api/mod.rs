//! API Module
//!
//! HTTP layer for the wall server.
//! `/api` and `/api/*` go through [`dispatch`]; every other path is served
//! from the static site.

pub mod dispatch;
pub mod error;
pub mod health;
pub mod invoke;
pub mod site;
pub mod wall;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{Method, header},
    routing::any,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::repository::WallStore;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn WallStore>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn WallStore>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

/// Create the main router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        // Health check
        .route("/api", any(invoke::invoke))
        // Wall endpoints; methods are checked by dispatch
        .route("/api/wall/{wall_id}", any(invoke::invoke_wall))
        .route("/api/wall/{wall_id}/content", any(invoke::invoke_wall))
        // Unknown API paths and the static site
        .fallback(invoke::fallback)
        // Add state and middleware
        .with_state(state)
        .layer(DefaultBodyLimit::max(invoke::MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
