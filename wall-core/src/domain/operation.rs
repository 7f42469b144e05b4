//! API operations and the method/path table that selects them

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Every operation the wall API answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    HealthCheck,
    GetWallCount,
    CreateWall,
    GetWallContent,
    PutWallContent,
}

/// An operation tag that names none of the known operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown operation '{0}'")]
pub struct UnknownOperation(pub String);

/// Result of matching a method and path against the route table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub operation: Operation,
    /// Raw `{wall_id}` segment, `None` when the path leaves it empty
    pub wall_id: Option<String>,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::HealthCheck,
        Operation::GetWallCount,
        Operation::CreateWall,
        Operation::GetWallContent,
        Operation::PutWallContent,
    ];

    /// Wire tag, as attached by a routing layer
    pub fn tag(self) -> &'static str {
        match self {
            Operation::HealthCheck => "health_check",
            Operation::GetWallCount => "get_wall_count",
            Operation::CreateWall => "create_wall",
            Operation::GetWallContent => "get_wall_content",
            Operation::PutWallContent => "put_wall_content",
        }
    }

    pub fn method(self) -> &'static str {
        match self {
            Operation::HealthCheck | Operation::GetWallCount | Operation::GetWallContent => "GET",
            Operation::CreateWall => "POST",
            Operation::PutWallContent => "PUT",
        }
    }

    /// Path template relative to the site root
    pub fn path_template(self) -> &'static str {
        match self {
            Operation::HealthCheck => "/api",
            Operation::GetWallCount | Operation::CreateWall => "/api/wall/{wall_id}",
            Operation::GetWallContent | Operation::PutWallContent => "/api/wall/{wall_id}/content",
        }
    }

    pub fn requires_wall_id(self) -> bool {
        !matches!(self, Operation::HealthCheck)
    }

    pub fn touches_storage(self) -> bool {
        self.requires_wall_id()
    }

    /// Match a method and path against the route table
    ///
    /// `/api` and `/api/` are the same resource. Returns `None` for anything
    /// the table does not list, including known paths with the wrong method.
    pub fn route(method: &str, path: &str) -> Option<Route> {
        let method = method.to_ascii_uppercase();
        let trimmed = path.strip_suffix('/').unwrap_or(path);
        let rest = trimmed.strip_prefix("/api")?;

        let segments: Vec<&str> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.strip_prefix('/')?.split('/').collect()
        };

        let segment_id = |raw: &str| (!raw.is_empty()).then(|| raw.to_string());

        let (operation, wall_id) = match (method.as_str(), segments.as_slice()) {
            ("GET", []) => (Operation::HealthCheck, None),
            ("GET", ["wall"]) => (Operation::GetWallCount, None),
            ("POST", ["wall"]) => (Operation::CreateWall, None),
            ("GET", ["wall", id]) => (Operation::GetWallCount, segment_id(*id)),
            ("POST", ["wall", id]) => (Operation::CreateWall, segment_id(*id)),
            ("GET", ["wall", id, "content"]) => (Operation::GetWallContent, segment_id(*id)),
            ("PUT", ["wall", id, "content"]) => (Operation::PutWallContent, segment_id(*id)),
            _ => return None,
        };

        Some(Route { operation, wall_id })
    }
}

impl FromStr for Operation {
    type Err = UnknownOperation;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.tag() == tag)
            .ok_or_else(|| UnknownOperation(tag.to_string()))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(method: &str, path: &str) -> Option<(Operation, Option<String>)> {
        Operation::route(method, path).map(|r| (r.operation, r.wall_id))
    }

    #[test]
    fn test_route_table() {
        assert_eq!(route("GET", "/api"), Some((Operation::HealthCheck, None)));
        assert_eq!(route("GET", "/api/"), Some((Operation::HealthCheck, None)));
        assert_eq!(
            route("GET", "/api/wall/kitchen"),
            Some((Operation::GetWallCount, Some("kitchen".into())))
        );
        assert_eq!(
            route("POST", "/api/wall/kitchen"),
            Some((Operation::CreateWall, Some("kitchen".into())))
        );
        assert_eq!(
            route("GET", "/api/wall/kitchen/content"),
            Some((Operation::GetWallContent, Some("kitchen".into())))
        );
        assert_eq!(
            route("PUT", "/api/wall/kitchen/content/"),
            Some((Operation::PutWallContent, Some("kitchen".into())))
        );
    }

    #[test]
    fn test_route_method_is_case_insensitive() {
        assert_eq!(route("get", "/api"), Some((Operation::HealthCheck, None)));
    }

    #[test]
    fn test_route_rejects_unlisted_combinations() {
        assert_eq!(route("POST", "/api"), None);
        assert_eq!(route("DELETE", "/api/wall/kitchen"), None);
        assert_eq!(route("POST", "/api/wall/kitchen/content"), None);
        assert_eq!(route("GET", "/api/walls"), None);
        assert_eq!(route("GET", "/apix"), None);
        assert_eq!(route("GET", "/index.html"), None);
        assert_eq!(route("GET", "/api/wall/kitchen/content/extra"), None);
    }

    #[test]
    fn test_route_missing_wall_id() {
        assert_eq!(route("POST", "/api/wall/"), Some((Operation::CreateWall, None)));
        assert_eq!(route("GET", "/api/wall//content"), Some((Operation::GetWallContent, None)));
    }

    #[test]
    fn test_tags_round_trip_through_from_str() {
        for op in Operation::ALL {
            assert_eq!(op.tag().parse::<Operation>(), Ok(op));
        }
        assert_eq!(
            "fake_operation".parse::<Operation>(),
            Err(UnknownOperation("fake_operation".into()))
        );
    }

    #[test]
    fn test_templates_resolve_to_their_operation() {
        for op in Operation::ALL {
            let path = op.path_template().replace("{wall_id}", "w");
            assert_eq!(route(op.method(), &path).map(|(o, _)| o), Some(op));
        }
    }

    #[test]
    fn test_only_health_check_skips_storage() {
        let storage_free: Vec<_> = Operation::ALL
            .into_iter()
            .filter(|op| !op.touches_storage())
            .collect();
        assert_eq!(storage_free, vec![Operation::HealthCheck]);
    }
}
