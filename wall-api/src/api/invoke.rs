//! HTTP adapter
//!
//! Turns axum requests into [`ApiRequest`] envelopes, runs them through
//! [`dispatch`] under the configured timeout, and turns the [`ApiResponse`]
//! back into an HTTP response.

use axum::{
    body::Bytes,
    extract::{
        FromRequest, Path, Request, State,
        rejection::{BytesRejection, PathRejection},
    },
    http::{HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use tower::ServiceExt;
use tracing::Instrument;
use uuid::Uuid;
use wall_core::dto::api::{ApiRequest, ApiResponse, WALL_ID_PARAM};

use crate::api::AppState;
use crate::api::dispatch::dispatch;
use crate::api::error::{ApiError, ApiResult};
use crate::api::site::{is_api_path, site_service};

/// Largest request body accepted, matching the function payload limit
pub const MAX_BODY_BYTES: usize = 6 * 1024 * 1024;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Any method on a route without path parameters
pub async fn invoke(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let req = build_request(&method, &uri, HashMap::new(), body);
    run(state, method, uri, req).await
}

/// Any method on a route carrying `{wall_id}`
///
/// A segment that fails to percent-decode is rejected here; dispatch never
/// sees it, so no wall is keyed by the raw undecoded text.
pub async fn invoke_wall(
    State(state): State<AppState>,
    wall_id: Result<Path<String>, PathRejection>,
    method: Method,
    uri: Uri,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let req = match wall_id {
        Ok(Path(wall_id)) => {
            let params = HashMap::from([(WALL_ID_PARAM.to_string(), wall_id)]);
            build_request(&method, &uri, params, body)
        }
        Err(e) => Err(ApiError::BadRequest(format!(
            "Invalid path parameter {WALL_ID_PARAM} for {method} {}: {}",
            uri.path(),
            e.body_text()
        ))),
    };
    run(state, method, uri, req).await
}

/// Everything no route claimed: unknown `/api/*` paths go to dispatch, the
/// rest to the static site
pub async fn fallback(State(state): State<AppState>, request: Request) -> Response {
    if !is_api_path(request.uri().path()) {
        return match site_service(&state.config.site_dir).oneshot(request).await {
            Ok(response) => response.into_response(),
            Err(never) => match never {},
        };
    }

    let method = request.method().clone();
    let uri = request.uri().clone();
    let body = Bytes::from_request(request, &state).await;
    let req = build_request(&method, &uri, HashMap::new(), body);
    run(state, method, uri, req).await
}

/// Envelope for one HTTP request
///
/// Bodies must be UTF-8 text and fit under [`MAX_BODY_BYTES`]; anything else
/// is answered with a JSON error instead of being rewritten.
fn build_request(
    method: &Method,
    uri: &Uri,
    path_parameters: HashMap<String, String>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<ApiRequest> {
    let body = body.map_err(|e| {
        let message = format!("Unreadable body for {method} {}: {}", uri.path(), e.body_text());
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(message)
        } else {
            ApiError::BadRequest(message)
        }
    })?;

    let mut req = ApiRequest::new(method.as_str(), uri.path());
    req.path_parameters = path_parameters;
    if !body.is_empty() {
        let text = String::from_utf8(body.to_vec()).map_err(|e| {
            ApiError::BadRequest(format!("Body is not UTF-8 for {method} {}: {e}", uri.path()))
        })?;
        req.body = Some(text);
    }
    Ok(req)
}

async fn run(state: AppState, method: Method, uri: Uri, req: ApiResult<ApiRequest>) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let span = tracing::info_span!(
        "invoke",
        request_id = %request_id,
        method = %method,
        path = %uri.path(),
        environment = %state.config.environment,
    );

    let limit = state.config.request_timeout;
    let response = async {
        let req = match req {
            Ok(req) => req.with_request_id(&request_id),
            Err(err) => {
                tracing::debug!("Rejected before dispatch: {:?}", err);
                return err.into_response();
            }
        };
        match tokio::time::timeout(limit, dispatch(&req, state.store.as_ref())).await {
            Ok(response) => {
                tracing::debug!("Invocation finished with status {}", response.status_code);
                response
            }
            Err(_) => ApiError::Timeout(limit).into_response(),
        }
    }
    .instrument(span)
    .await;

    into_http(response, &request_id)
}

fn into_http(response: ApiResponse, request_id: &str) -> Response {
    let status = StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut http = (status, response.body).into_response();

    let headers = http.headers_mut();
    for (name, value) in &response.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            headers.insert(name, value);
        }
    }
    if let Ok(value) = HeaderValue::from_str(request_id) {
        headers.insert(REQUEST_ID_HEADER, value);
    }

    http
}
