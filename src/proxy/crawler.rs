//! Proxy crawler module for fetching source lists
//!
//! This module provides functionality for:
//! - Fetching the raw body of a configured source
//! - Turning that body into raw candidates according to the source method

use crate::error::{ProxyError, Result};
use crate::proxy::models::Source;
use crate::proxy::parser::ProxyParser;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default timeout for HTTP requests in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default user agent for HTTP requests
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Fetches the raw body of a source URL.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Configuration for proxy crawler
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Timeout for HTTP requests
    pub timeout: Duration,
    /// User agent for HTTP requests
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl CrawlerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }
}

/// Plain reqwest fetcher. No retries; anything but 200 is a failure.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_config(CrawlerConfig::default())
    }

    pub fn with_config(config: CrawlerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| ProxyError::SourceConfig(format!("error creating HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let failure = |message: String| ProxyError::SourceFetchFailure {
            url: url.to_string(),
            message,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| failure(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(failure(format!("failed to fetch data: {}", status)));
        }

        let body = response.bytes().await.map_err(|e| failure(e.to_string()))?;
        Ok(body.to_vec())
    }
}

/// Fetches sources and extracts their raw candidates
#[derive(Clone)]
pub struct ProxyCrawler {
    fetcher: Arc<dyn SourceFetcher>,
}

impl ProxyCrawler {
    pub fn new(fetcher: Arc<dyn SourceFetcher>) -> Self {
        Self { fetcher }
    }

    /// Fetch a source and return its raw, unvalidated candidates
    pub async fn candidates(&self, source: &Source) -> Result<Vec<String>> {
        let body = self.fetcher.fetch(&source.url).await?;
        let body = String::from_utf8_lossy(&body);
        let candidates = ProxyParser::extract(&source.method, &body)?;
        debug!(
            url = %source.url,
            method = %source.method,
            count = candidates.len(),
            "extracted candidates"
        );
        Ok(candidates)
    }
}
