//! Server configuration
//!
//! Everything is read from environment variables, the way the function
//! handlers receive their table name, key attribute and environment.

use std::path::PathBuf;
use std::time::Duration;
use wall_core::domain::environment::Environment;

/// API server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Deployment environment, used for diagnostics
    pub environment: Environment,

    /// Storage table holding one row per wall
    pub table_name: String,

    /// Primary-key attribute (column) of the table
    pub primary_key: String,

    /// PostgreSQL URL; without one walls live in memory
    pub database_url: Option<String>,

    /// Listen address (e.g., "0.0.0.0:8080")
    pub bind_addr: String,

    /// Root of the static site served for non-API paths
    pub site_dir: PathBuf,

    /// Upper bound on a single API invocation
    pub request_timeout: Duration,
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - TABLE_NAME (default: walls)
    /// - PRIMARY_KEY (default: wall_id)
    /// - ENVIRONMENT (default: local)
    /// - DATABASE_URL (default: unset, in-memory store)
    /// - BIND_ADDR (default: 0.0.0.0:8080)
    /// - SITE_DIR (default: static)
    /// - REQUEST_TIMEOUT (seconds, default: 20)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let environment = match lookup("ENVIRONMENT") {
            Some(raw) => raw.parse::<Environment>()?,
            None => defaults.environment,
        };

        let request_timeout = match lookup("REQUEST_TIMEOUT") {
            Some(raw) => raw
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| anyhow::anyhow!("REQUEST_TIMEOUT must be a number of seconds, got '{raw}'"))?,
            None => defaults.request_timeout,
        };

        let config = Self {
            environment,
            table_name: lookup("TABLE_NAME").unwrap_or(defaults.table_name),
            primary_key: lookup("PRIMARY_KEY").unwrap_or(defaults.primary_key),
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            site_dir: lookup("SITE_DIR").map(PathBuf::from).unwrap_or(defaults.site_dir),
            request_timeout,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if !is_identifier(&self.table_name) {
            anyhow::bail!("TABLE_NAME '{}' is not a valid table identifier", self.table_name);
        }

        if !is_identifier(&self.primary_key) {
            anyhow::bail!("PRIMARY_KEY '{}' is not a valid column identifier", self.primary_key);
        }

        if self.bind_addr.is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if let Some(url) = &self.database_url {
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                anyhow::bail!("DATABASE_URL must start with postgres:// or postgresql://");
            }
        }

        if self.request_timeout.is_zero() {
            anyhow::bail!("request_timeout must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: Environment::Local,
            table_name: "walls".to_string(),
            primary_key: "wall_id".to_string(),
            database_url: None,
            bind_addr: "0.0.0.0:8080".to_string(),
            site_dir: PathBuf::from("static"),
            request_timeout: Duration::from_secs(20),
        }
    }
}

/// Longest identifier PostgreSQL keeps without truncating
const MAX_IDENTIFIER_LEN: usize = 63;

/// `[A-Za-z_][A-Za-z0-9_-]*`, safe to splice into SQL as a quoted identifier
pub fn is_identifier(name: &str) -> bool {
    if name.len() > MAX_IDENTIFIER_LEN {
        return false;
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        }
        _ => false,
    }
}
