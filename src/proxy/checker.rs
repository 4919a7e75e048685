//! Proxy checker module for live connectivity probes

use crate::config::{self, HTTPS_TESTING_SITES, HTTP_TESTING_SITES, USER_AGENTS};
use crate::error::{ProbeError, ProxyError, Result};
use crate::proxy::models::{ProxyAddress, ProxyRecord, ProxyType};
use async_trait::async_trait;
use chrono::{Local, SecondsFormat};
use rand::seq::SliceRandom;
use reqwest::header::USER_AGENT;
use reqwest::{Client, Proxy as ReqwestProxy, StatusCode};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::debug;

/// Default timeout for proxy checks in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default number of probes allowed in flight at once
const DEFAULT_CONCURRENCY: usize = 500;

/// A live connectivity check of one proxy.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Probe `ip:port` as a `category` proxy, returning the measured record.
    async fn check(&self, category: &ProxyType, address: &ProxyAddress) -> Result<ProxyRecord>;
}

/// Configuration for proxy checker
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Timeout covering connect, TLS handshake and the whole round trip
    pub timeout: Duration,
    /// Number of concurrent checks
    pub concurrency: usize,
    /// Testing sites for HTTP, SOCKS4 and SOCKS5 probes
    pub http_testing_sites: Vec<String>,
    /// Testing sites for HTTPS probes
    pub https_testing_sites: Vec<String>,
    pub user_agents: Vec<String>,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            concurrency: DEFAULT_CONCURRENCY,
            http_testing_sites: config::to_owned_list(HTTP_TESTING_SITES),
            https_testing_sites: config::to_owned_list(HTTPS_TESTING_SITES),
            user_agents: config::to_owned_list(USER_AGENTS),
        }
    }
}

impl CheckerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_http_testing_sites(mut self, sites: Vec<String>) -> Self {
        self.http_testing_sites = sites;
        self
    }

    pub fn with_https_testing_sites(mut self, sites: Vec<String>) -> Self {
        self.https_testing_sites = sites;
        self
    }

    pub fn with_user_agents(mut self, user_agents: Vec<String>) -> Self {
        self.user_agents = user_agents;
        self
    }
}

/// Proxy checker backed by reqwest, gated by a global semaphore
#[derive(Clone)]
pub struct ProxyChecker {
    config: CheckerConfig,
    gate: Arc<Semaphore>,
}

impl ProxyChecker {
    /// Create a new proxy checker with default configuration
    pub fn new() -> Self {
        Self::with_config(CheckerConfig::default())
    }

    /// Create a new proxy checker with custom configuration
    pub fn with_config(config: CheckerConfig) -> Self {
        let gate = Arc::new(Semaphore::new(config.concurrency.max(1)));
        Self { config, gate }
    }

    /// Probes that can start right now without waiting on the gate
    pub fn available_permits(&self) -> usize {
        self.gate.available_permits()
    }

    /// Pick the testing site for a category. HTTPS has its own pool.
    pub fn testing_site(&self, category: &ProxyType) -> Option<&str> {
        let pool = if *category == ProxyType::Https {
            &self.config.https_testing_sites
        } else {
            &self.config.http_testing_sites
        };
        pool.choose(&mut rand::thread_rng()).map(String::as_str)
    }

    pub fn random_user_agent(&self) -> Option<&str> {
        self.config
            .user_agents
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
    }

    /// Create a one-shot reqwest client routed through the proxy
    fn create_client(&self, category: &ProxyType, address: &ProxyAddress) -> Result<Client> {
        if !category.is_supported() {
            return Err(ProxyError::UnsupportedCategory(category.to_string()));
        }
        let reqwest_proxy = ReqwestProxy::all(address.url(category)).map_err(ProbeError::ProxyUrl)?;

        let client = Client::builder()
            .proxy(reqwest_proxy)
            .pool_max_idle_per_host(0)
            .connect_timeout(self.config.timeout)
            .tcp_keepalive(self.config.timeout)
            .timeout(self.config.timeout)
            .danger_accept_invalid_certs(*category == ProxyType::Https)
            .build()
            .map_err(ProbeError::Client)?;

        Ok(client)
    }
}

#[async_trait]
impl Prober for ProxyChecker {
    async fn check(&self, category: &ProxyType, address: &ProxyAddress) -> Result<ProxyRecord> {
        if !category.is_supported() {
            return Err(ProxyError::UnsupportedCategory(category.to_string()));
        }

        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| ProbeError::GateClosed)?;

        let client = self.create_client(category, address)?;
        let testing_site = self
            .testing_site(category)
            .ok_or(ProbeError::NoTestingSite)?;

        let mut request = client.get(testing_site);
        if let Some(user_agent) = self.random_user_agent() {
            request = request.header(USER_AGENT, user_agent);
        }

        let start = Instant::now();
        let response = request.send().await.map_err(ProbeError::Request)?;
        let time_taken = start.elapsed().as_secs_f64();
        let checked_at = Local::now().to_rfc3339_opts(SecondsFormat::Secs, false);

        if response.status() != StatusCode::OK {
            debug!(
                proxy = %address,
                category = %category,
                status = %response.status(),
                site = testing_site,
                "probe rejected by testing site"
            );
            return Err(ProbeError::Status(response.status()).into());
        }

        Ok(ProxyRecord::checked(
            category.clone(),
            address,
            time_taken,
            checked_at,
        ))
    }
}

impl Default for ProxyChecker {
    fn default() -> Self {
        Self::new()
    }
}
