//! Proxy module for validating, checking and aggregating proxies
//!
//! This module provides functionality for:
//! - Validating raw `ip:port` candidates and extracting them from source lists
//! - Excluding special-purpose and explicitly blocked addresses
//! - Checking proxy liveness under a global concurrency ceiling
//! - Claiming each (category, proxy) pair at most once per run
//! - Merging accepted proxies into per-protocol and global views

pub mod checker;
pub mod classifier;
pub mod crawler;
pub mod ledger;
pub mod models;
pub mod parser;
pub mod processor;
pub mod store;

pub use checker::{CheckerConfig, Prober, ProxyChecker};
pub use classifier::AddressClassifier;
pub use crawler::{CrawlerConfig, HttpFetcher, ProxyCrawler, SourceFetcher};
pub use ledger::DedupLedger;
pub use models::{ProxyAddress, ProxyAggregate, ProxyRecord, ProxyType, Source, SourceMethod};
pub use parser::ProxyParser;
pub use processor::ProxyProcessor;
pub use store::ProxyStore;
