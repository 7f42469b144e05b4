//! Wall domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use thiserror::Error;

use crate::dto::wall::WallSummary;

/// Longest accepted wall identifier, in characters
pub const MAX_WALL_ID_LEN: usize = 255;

/// Reasons a raw wall identifier is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WallIdError {
    #[error("wall id cannot be empty")]
    Empty,
    #[error("wall id is too long (max {MAX_WALL_ID_LEN} characters)")]
    TooLong,
    #[error("wall id cannot contain '/'")]
    ContainsSlash,
}

/// Externally supplied wall identifier, the table's primary key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WallId(String);

impl WallId {
    pub fn parse(raw: impl Into<String>) -> Result<Self, WallIdError> {
        let raw = raw.into();

        if raw.trim().is_empty() {
            return Err(WallIdError::Empty);
        }
        if raw.chars().count() > MAX_WALL_ID_LEN {
            return Err(WallIdError::TooLong);
        }
        if raw.contains('/') {
            return Err(WallIdError::ContainsSlash);
        }

        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for WallId {
    type Error = WallIdError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(raw)
    }
}

impl From<WallId> for String {
    fn from(id: WallId) -> Self {
        id.0
    }
}

impl AsRef<str> for WallId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A collaborative canvas
///
/// `content` is stored and returned verbatim. `count` is recomputed from the
/// content on every write and never set directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub wall_id: WallId,
    pub content: Value,
    pub count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wall {
    /// A freshly created wall with empty drawing content
    pub fn new(wall_id: WallId, now: DateTime<Utc>) -> Self {
        let content = initial_content();
        Self {
            wall_id,
            count: count_objects(&content),
            content,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the content wholesale
    pub fn replace_content(&mut self, content: Value, now: DateTime<Utc>) {
        self.count = count_objects(&content);
        self.content = content;
        self.updated_at = now;
    }

    pub fn summary(&self) -> WallSummary {
        WallSummary {
            wall_id: self.wall_id.to_string(),
            count: self.count,
        }
    }
}

/// Content of a wall nobody has drawn on yet
pub fn initial_content() -> Value {
    json!({ "objects": [] })
}

/// Number of drawable objects in a content document
///
/// Canvas exports keep their shapes under `objects`; a bare array is counted
/// as-is. Anything else counts as zero.
pub fn count_objects(content: &Value) -> u64 {
    let objects = match content {
        Value::Array(items) => items.len(),
        Value::Object(map) => map
            .get("objects")
            .and_then(Value::as_array)
            .map_or(0, Vec::len),
        _ => 0,
    };
    objects as u64
}
