//! Configuration Module
//!
//! Runtime configuration from environment variables (with `.env` support).

use std::env;
use std::time::Duration;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Eko-Kampüs API.
    pub api_base_url: String,
    /// Per-request timeout for API calls.
    pub http_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// The API base address is required; there is no built-in default
    /// address to fall back to.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let api_base_url = env::var("EKO_KAMPUS_API_URL")
            .map(|v| v.trim().to_string())
            .map_err(|_| ConfigError::Missing("EKO_KAMPUS_API_URL"))?;

        let http_timeout = env::var("EKO_KAMPUS_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(30));

        Ok(Self {
            api_base_url,
            http_timeout,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
