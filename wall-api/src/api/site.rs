//! Static site
//!
//! Stands in for the content-delivery layer: files come from the site
//! directory, directories resolve to `index.html`, and misses get
//! `error.html` with a 404.

use std::path::Path;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::set_status::SetStatus;

pub const INDEX_DOCUMENT: &str = "index.html";
pub const ERROR_DOCUMENT: &str = "error.html";

pub fn site_service(site_dir: &Path) -> ServeDir<SetStatus<ServeFile>> {
    ServeDir::new(site_dir)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(site_dir.join(ERROR_DOCUMENT)))
}

/// Paths the content-delivery layer forwards to the API
pub fn is_api_path(path: &str) -> bool {
    path == "/api" || path.starts_with("/api/")
}
