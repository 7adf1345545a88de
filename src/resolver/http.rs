//! HTTP object storage resolver.
//!
//! Builds `{base_url}{percent-encoded key}?alt=media` and confirms the object
//! exists with a `HEAD` request before handing the URL out.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use super::Resolver;
use crate::config::Config;
use crate::error::{ConfigError, ResolveError};

#[derive(Debug, Clone)]
pub struct HttpResolver {
    client: Client,
    base_url: String,
}

impl HttpResolver {
    /// Creates a resolver against `base_url`.
    ///
    /// Fails when the base URL is empty or not an absolute http(s) URL, since
    /// no key could ever resolve against it.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let base_url = base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigError::MissingBaseUrl);
        }
        let parsed = reqwest::Url::parse(base_url)
            .map_err(|e| ConfigError::InvalidBaseUrl(format!("{}: {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl(format!(
                "{}: unsupported scheme",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    /// Creates a resolver from `Config::base_url` and `Config::request_timeout`.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let base_url = config.base_url.as_deref().ok_or(ConfigError::MissingBaseUrl)?;
        Self::new(base_url, config.request_timeout)
    }

    /// Download URL for a key.
    pub fn url_for(&self, key: &str) -> String {
        format!("{}{}?alt=media", self.base_url, urlencoding::encode(key))
    }
}

#[async_trait]
impl Resolver for HttpResolver {
    async fn resolve(&self, key: &str) -> Result<String, ResolveError> {
        let url = self.url_for(key);
        let response = self
            .client
            .head(&url)
            .send()
            .await
            .map_err(|e| ResolveError::Network(e.to_string()))?;

        let status = response.status();
        debug!("HEAD {} -> {}", url, status);

        if status.is_success() {
            Ok(url)
        } else if status == StatusCode::NOT_FOUND {
            Err(ResolveError::NotFound(key.to_string()))
        } else {
            Err(ResolveError::Status {
                key: key.to_string(),
                status: status.as_u16(),
            })
        }
    }
}
