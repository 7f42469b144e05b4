//! Configuration module

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the site; the API lives under `/api`
    pub api_url: String,
}
