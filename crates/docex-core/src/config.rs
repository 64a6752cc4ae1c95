//! Configuration module
//!
//! Client settings come from the environment (after loading `.env`), with
//! CLI flags layered on top by the binary.

use std::env;
use std::time::Duration;

use crate::error::ConfigError;

const DEFAULT_API_URL: &str = "http://localhost:5000";
const DEFAULT_API_PREFIX: &str = "/api";
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the extraction service, without trailing slash.
    pub api_url: String,
    pub api_prefix: String,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// DOCEX_API_URL (or API_URL), DOCEX_API_PREFIX, DOCEX_REQUEST_TIMEOUT_SECS.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = lookup("DOCEX_API_URL")
            .or_else(|| lookup("API_URL"))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let api_prefix =
            lookup("DOCEX_API_PREFIX").unwrap_or_else(|| DEFAULT_API_PREFIX.to_string());

        let request_timeout = match lookup("DOCEX_REQUEST_TIMEOUT_SECS") {
            Some(raw) => parse_timeout("DOCEX_REQUEST_TIMEOUT_SECS", &raw)?,
            None => Duration::from_secs(REQUEST_TIMEOUT_SECS),
        };

        let config = Self {
            api_url: api_url.trim().trim_end_matches('/').to_string(),
            api_prefix: api_prefix.trim().trim_end_matches('/').to_string(),
            request_timeout,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidApiUrl(self.api_url.clone()));
        }

        if !self.api_prefix.is_empty() && !self.api_prefix.starts_with('/') {
            return Err(ConfigError::InvalidApiPrefix(self.api_prefix.clone()));
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout {
                name: "request timeout",
                value: "0".to_string(),
            });
        }

        Ok(())
    }

    pub fn extract_path(&self) -> String {
        format!("{}/extract", self.api_prefix)
    }

    pub fn health_path(&self) -> String {
        format!("{}/health", self.api_prefix)
    }
}

fn parse_timeout(name: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidTimeout {
            name,
            value: raw.to_string(),
        }),
    }
}
