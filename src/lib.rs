//! Proxy Sweep - Proxy Harvester and Checker
//!
//! Harvests HTTP, HTTPS, SOCKS4 and SOCKS5 proxies from public source lists,
//! filters out special-purpose addresses, probes each candidate at most once
//! per run under a global concurrency ceiling, and merges the survivors into
//! per-protocol and global views ready for export.

pub mod config;
pub mod error;
pub mod export;
pub mod harvester;
pub mod proxy;

pub use error::{ProbeError, ProxyError, Result};
pub use export::{ExportFormat, Exporter};
pub use harvester::{Harvester, RunSummary};
pub use proxy::*;

use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory the views are exported to
    pub output_dir: PathBuf,
    pub formats: Vec<ExportFormat>,
    pub checker: CheckerConfig,
    pub crawler: CrawlerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("storage"),
            formats: ExportFormat::ALL.to_vec(),
            checker: CheckerConfig::default(),
            crawler: CrawlerConfig::default(),
        }
    }
}
