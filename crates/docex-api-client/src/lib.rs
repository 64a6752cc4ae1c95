//! Shared HTTP client for the docex extraction service.
//!
//! Provides a minimal client with a generic GET helper and the two domain
//! calls the service exposes: `POST {prefix}/extract` (see [`api`]) and
//! `GET {prefix}/health`. The controller and the CLI use this client directly.

pub mod api;

use anyhow::{Context, Result};
use docex_core::ClientConfig;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP client for the extraction service.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    extract_path: String,
    health_path: String,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate().context("Invalid client configuration")?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            extract_path: config.extract_path(),
            health_path: config.health_path(),
            timeout: config.request_timeout,
        })
    }

    /// Create client from environment: DOCEX_API_URL (or API_URL),
    /// DOCEX_API_PREFIX, DOCEX_REQUEST_TIMEOUT_SECS.
    pub fn from_env() -> Result<Self> {
        let config = ClientConfig::from_env().context("Failed to load client configuration")?;
        Self::new(&config)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET request. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.build_url(path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow::anyhow!(
                "API request failed with status {}: {}",
                status,
                error_text
            ));
        }

        let body: T = response
            .json()
            .await
            .context("Failed to parse response as JSON")?;

        Ok(body)
    }

    /// Raw client for custom requests.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

pub use api::HealthResponse;
