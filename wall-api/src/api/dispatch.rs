//! Request dispatch
//!
//! Resolves an [`ApiRequest`] to exactly one [`Operation`] and runs its
//! handler. An explicit operation tag from the routing layer wins over the
//! method/path table. Whatever happens, the caller gets an [`ApiResponse`].

use serde_json::Value;
use wall_core::domain::operation::Operation;
use wall_core::dto::api::{ApiRequest, ApiResponse, WALL_ID_PARAM};

use crate::api::error::{ApiError, ApiResult};
use crate::api::{health, wall};
use crate::repository::WallStore;

/// Operation selected for a request, with its wall id if one was supplied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub operation: Operation,
    pub wall_id: Option<String>,
}

impl Resolved {
    fn require_wall_id(&self, req: &ApiRequest) -> ApiResult<&str> {
        self.wall_id.as_deref().ok_or_else(|| {
            ApiError::BadRequest(format!(
                "Missing path parameter {WALL_ID_PARAM} for {} {}",
                req.http_method, req.path
            ))
        })
    }
}

/// Pick the operation for a request
///
/// A decoded `wall_id` path parameter is preferred over the raw path segment.
pub fn resolve(req: &ApiRequest) -> ApiResult<Resolved> {
    let routed = Operation::route(&req.http_method, &req.path);

    let operation = match req.request_context.operation_name.as_deref() {
        Some(tag) => tag.parse::<Operation>().map_err(|e| {
            ApiError::BadRequest(format!("Rejected {} {}: {e}", req.http_method, req.path))
        })?,
        None => routed.as_ref().map(|r| r.operation).ok_or_else(|| {
            ApiError::BadRequest(format!(
                "Unsupported method and path: {} {}",
                req.http_method, req.path
            ))
        })?,
    };

    let from_path = routed
        .filter(|r| r.operation == operation)
        .and_then(|r| r.wall_id);
    let wall_id = req
        .path_parameter(WALL_ID_PARAM)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .or(from_path);

    Ok(Resolved { operation, wall_id })
}

/// Run a request to completion
pub async fn dispatch(req: &ApiRequest, store: &dyn WallStore) -> ApiResponse {
    match route(req, store).await {
        Ok(response) => response,
        Err(err) => {
            tracing::debug!("Rejected {} {}: {:?}", req.http_method, req.path, err);
            err.into_response()
        }
    }
}

async fn route(req: &ApiRequest, store: &dyn WallStore) -> ApiResult<ApiResponse> {
    let resolved = resolve(req)?;

    match resolved.operation {
        Operation::HealthCheck => Ok(health::health_check()),
        Operation::GetWallCount => wall::get_wall_count(store, resolved.require_wall_id(req)?).await,
        Operation::CreateWall => wall::create_wall(store, resolved.require_wall_id(req)?).await,
        Operation::GetWallContent => {
            wall::get_wall_content(store, resolved.require_wall_id(req)?).await
        }
        Operation::PutWallContent => {
            let wall_id = resolved.require_wall_id(req)?;
            let content = json_body(req)?;
            wall::put_wall_content(store, wall_id, content).await
        }
    }
}

fn json_body(req: &ApiRequest) -> ApiResult<Value> {
    let raw = req
        .body
        .as_deref()
        .filter(|body| !body.trim().is_empty())
        .ok_or_else(|| {
            ApiError::BadRequest(format!("Missing JSON body for {} {}", req.http_method, req.path))
        })?;

    serde_json::from_str(raw).map_err(|e| {
        ApiError::BadRequest(format!(
            "Invalid JSON body for {} {}: {e}",
            req.http_method, req.path
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{MemoryWallStore, StoreError, StoreResult};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wall_core::domain::wall::{Wall, WallId};

    /// Memory store that counts every call
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryWallStore,
        calls: AtomicUsize,
    }

    impl CountingStore {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WallStore for CountingStore {
        async fn find(&self, id: &WallId) -> StoreResult<Option<Wall>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.find(id).await
        }

        async fn insert(&self, wall: &Wall) -> StoreResult<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.insert(wall).await
        }

        async fn replace_content(
            &self,
            id: &WallId,
            content: Value,
            updated_at: DateTime<Utc>,
        ) -> StoreResult<Option<Wall>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.replace_content(id, content, updated_at).await
        }
    }

    /// Store whose backend is always down
    struct FailingStore;

    #[async_trait]
    impl WallStore for FailingStore {
        async fn find(&self, _id: &WallId) -> StoreResult<Option<Wall>> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn insert(&self, _wall: &Wall) -> StoreResult<bool> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn replace_content(
            &self,
            _id: &WallId,
            _content: Value,
            _updated_at: DateTime<Utc>,
        ) -> StoreResult<Option<Wall>> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }
    }

    fn body(resp: &ApiResponse) -> Value {
        resp.json_body().unwrap()
    }

    #[tokio::test]
    async fn test_health_check_touches_no_storage() {
        let store = CountingStore::default();

        let resp = dispatch(&ApiRequest::new("GET", "/api/"), &store).await;

        assert_eq!(resp.status_code, 200);
        assert_eq!(body(&resp), json!("Alive"));
        assert_eq!(resp.headers.get("Cache-Control").map(String::as_str), Some("no-cache"));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_requests_echo_method_and_path() {
        let store = CountingStore::default();
        let cases = [
            ("DELETE", "/api/wall/kitchen"),
            ("POST", "/api"),
            ("PATCH", "/api/wall/kitchen/content"),
            ("GET", "/api/walls/kitchen"),
            ("GET", "/not-api"),
            ("PUT", "/api/wall/kitchen"),
        ];

        for (method, path) in cases {
            let resp = dispatch(&ApiRequest::new(method, path), &store).await;
            assert_eq!(resp.status_code, 400, "{method} {path}");
            let message = body(&resp);
            let message = message.as_str().unwrap();
            assert!(message.contains(method), "{message}");
            assert!(message.contains(path), "{message}");
        }
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_wall_id_is_rejected() {
        let store = CountingStore::default();

        let resp = dispatch(&ApiRequest::new("POST", "/api/wall/"), &store).await;

        assert_eq!(resp.status_code, 400);
        let message = body(&resp);
        let message = message.as_str().unwrap();
        assert!(message.contains("wall_id"));
        assert!(message.contains("POST /api/wall/"));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_create_then_count_is_zero() {
        let store = MemoryWallStore::new();

        let created = dispatch(&ApiRequest::new("POST", "/api/wall/kitchen"), &store).await;
        assert_eq!(created.status_code, 201);

        let resp = dispatch(&ApiRequest::new("GET", "/api/wall/kitchen"), &store).await;
        assert_eq!(resp.status_code, 200);
        assert_eq!(body(&resp), json!({ "wall_id": "kitchen", "count": 0 }));
    }

    #[tokio::test]
    async fn test_create_existing_wall_conflicts() {
        let store = MemoryWallStore::new();
        let req = ApiRequest::new("POST", "/api/wall/kitchen");

        dispatch(&req, &store).await;
        let resp = dispatch(&req, &store).await;

        assert_eq!(resp.status_code, 409);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_put_then_get_content_round_trip() {
        let store = MemoryWallStore::new();
        dispatch(&ApiRequest::new("POST", "/api/wall/w"), &store).await;

        let payload = r#"{"version":"4.6.0","objects":[{"type":"rect","left":10,"top":20,"fill":"yellow"}]}"#;
        let put = dispatch(
            &ApiRequest::new("PUT", "/api/wall/w/content").with_body(payload),
            &store,
        )
        .await;
        assert_eq!(put.status_code, 200);
        assert_eq!(body(&put), json!({ "wall_id": "w", "count": 1 }));

        let get = dispatch(&ApiRequest::new("GET", "/api/wall/w/content"), &store).await;
        assert_eq!(get.status_code, 200);
        assert_eq!(body(&get), serde_json::from_str::<Value>(payload).unwrap());
    }

    #[tokio::test]
    async fn test_missing_walls_are_not_found() {
        let store = MemoryWallStore::new();

        let count = dispatch(&ApiRequest::new("GET", "/api/wall/ghost"), &store).await;
        let content = dispatch(&ApiRequest::new("GET", "/api/wall/ghost/content"), &store).await;
        let put = dispatch(
            &ApiRequest::new("PUT", "/api/wall/ghost/content").with_body("[]"),
            &store,
        )
        .await;

        assert_eq!(count.status_code, 404);
        assert_eq!(content.status_code, 404);
        assert_eq!(put.status_code, 404);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_put_requires_valid_json_body() {
        let store = MemoryWallStore::new();
        dispatch(&ApiRequest::new("POST", "/api/wall/w"), &store).await;

        let missing = dispatch(&ApiRequest::new("PUT", "/api/wall/w/content"), &store).await;
        let invalid = dispatch(
            &ApiRequest::new("PUT", "/api/wall/w/content").with_body("{not json"),
            &store,
        )
        .await;

        assert_eq!(missing.status_code, 400);
        assert_eq!(invalid.status_code, 400);
        assert!(body(&invalid).as_str().unwrap().contains("Invalid JSON body"));
    }

    #[tokio::test]
    async fn test_operation_tag_overrides_path() {
        let store = CountingStore::default();
        let req = ApiRequest::new("GET", "/prod/anything")
            .with_operation("health_check");

        let resp = dispatch(&req, &store).await;

        assert_eq!(resp.status_code, 200);
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_operation_tag_uses_path_parameters() {
        let store = MemoryWallStore::new();
        let req = ApiRequest::new("POST", "/stage/walls")
            .with_operation("create_wall")
            .with_path_parameter("wall_id", "my unit test wall name");

        let resp = dispatch(&req, &store).await;

        assert_eq!(resp.status_code, 201);
        assert_eq!(body(&resp)["wall_id"], "my unit test wall name");
    }

    #[tokio::test]
    async fn test_unknown_operation_tag() {
        let store = CountingStore::default();
        let req = ApiRequest::new("GET", "/api").with_operation("unknown_operation");

        let resp = dispatch(&req, &store).await;

        assert_eq!(resp.status_code, 400);
        let message = body(&resp);
        let message = message.as_str().unwrap();
        assert!(message.contains("unknown_operation"));
        assert!(message.contains("GET /api"));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_decoded_path_parameter_wins() {
        let store = MemoryWallStore::new();
        let req = ApiRequest::new("POST", "/api/wall/team%20wall")
            .with_path_parameter("wall_id", "team wall");

        dispatch(&req, &store).await;

        let id = WallId::parse("team wall").unwrap();
        assert!(store.find(&id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_storage_failure_is_bad_request() {
        let resp = dispatch(&ApiRequest::new("GET", "/api/wall/w"), &FailingStore).await;

        assert_eq!(resp.status_code, 400);
        assert!(body(&resp).as_str().unwrap().starts_with("Storage error"));
    }

    /// Documented race: concurrent puts are not serialized, the last write wins
    #[tokio::test]
    async fn test_concurrent_puts_last_write_wins() {
        let store = Arc::new(MemoryWallStore::new());
        dispatch(&ApiRequest::new("POST", "/api/wall/shared"), store.as_ref()).await;

        let payloads: Vec<Value> = (0..8).map(|i| json!({ "objects": [], "writer": i })).collect();
        let mut tasks = Vec::new();
        for payload in payloads.clone() {
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(async move {
                let req = ApiRequest::new("PUT", "/api/wall/shared/content")
                    .with_body(payload.to_string());
                dispatch(&req, store.as_ref()).await.status_code
            }));
        }
        for task in tasks {
            assert_eq!(task.await.unwrap(), 200);
        }

        let get = dispatch(&ApiRequest::new("GET", "/api/wall/shared/content"), store.as_ref()).await;
        assert!(payloads.contains(&body(&get)));
    }
}
