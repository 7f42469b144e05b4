//! Request/response envelope for API invocations
//!
//! The shape follows a proxy-style function invocation: the routing layer
//! hands over method, path, decoded path parameters and an optional explicit
//! operation tag; the handler answers with status, headers and a JSON body.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};

pub const WALL_ID_PARAM: &str = "wall_id";

/// Headers every API response carries
pub const CONTENT_TYPE_JSON: (&str, &str) = ("Content-Type", "application/json");
pub const CACHE_CONTROL_NO_CACHE: (&str, &str) = ("Cache-Control", "no-cache");

/// Metadata attached by the routing layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRequest {
    pub http_method: String,
    pub path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub path_parameters: HashMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub request_context: RequestContext,
    #[serde(default)]
    pub body: Option<String>,
}

/// Proxy events send `null` for routes without parameters
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ApiRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            http_method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_path_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_parameters.insert(name.into(), value.into());
        self
    }

    pub fn with_operation(mut self, tag: impl Into<String>) -> Self {
        self.request_context.operation_name = Some(tag.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_context.request_id = Some(request_id.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn path_parameter(&self, name: &str) -> Option<&str> {
        self.path_parameters.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    /// JSON text
    pub body: String,
}

impl ApiResponse {
    /// Response with `value` serialized as the JSON body
    pub fn json<T: Serialize + ?Sized>(status_code: u16, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self::with_body(status_code, body),
            Err(e) => Self::error(500, &format!("Failed to serialize response: {e}")),
        }
    }

    /// Error response whose body is a JSON string
    pub fn error(status_code: u16, message: &str) -> Self {
        let body = serde_json::Value::String(message.to_string()).to_string();
        Self::with_body(status_code, body)
    }

    fn with_body(status_code: u16, body: String) -> Self {
        let headers = [CONTENT_TYPE_JSON, CACHE_CONTROL_NO_CACHE]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            status_code,
            headers,
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Body parsed back into JSON
    pub fn json_body(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.body)
    }
}
