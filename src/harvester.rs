//! Run orchestration
//!
//! One task per source, then one task per extracted candidate, joined at both
//! levels before the run returns. Probe admission is bounded separately by the
//! checker's gate.

use crate::config::{RESERVED_NETWORKS, SPECIAL_IPS};
use crate::error::Result;
use crate::proxy::{
    AddressClassifier, HttpFetcher, ProxyChecker, ProxyCrawler, ProxyProcessor, ProxyRecord,
    ProxyStore, Source,
};
use crate::Config;
use futures::future::join_all;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, error, info, trace, warn};

/// Outcome counts for one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Sources that were scheduled (supported category)
    pub sources: usize,
    pub failed_sources: usize,
    pub candidates: usize,
    pub stored: usize,
    pub duplicates: usize,
    /// Candidates rejected before any network activity
    pub rejected: usize,
    pub probe_failures: usize,
    /// Distinct addresses across all categories
    pub aggregates: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Default)]
struct Counters {
    failed_sources: AtomicUsize,
    candidates: AtomicUsize,
    stored: AtomicUsize,
    duplicates: AtomicUsize,
    rejected: AtomicUsize,
    probe_failures: AtomicUsize,
}

impl Counters {
    fn record(&self, raw: &str, outcome: &Result<ProxyRecord>) {
        match outcome {
            Ok(record) => {
                self.stored.fetch_add(1, Ordering::Relaxed);
                trace!(proxy = %record.proxy, category = %record.category, "stored");
            }
            Err(e) if e.is_duplicate() => {
                self.duplicates.fetch_add(1, Ordering::Relaxed);
                trace!(candidate = raw, "already processed");
            }
            Err(e) if e.is_rejection() => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                debug!(candidate = raw, reason = %e, "candidate rejected");
            }
            Err(e) => {
                self.probe_failures.fetch_add(1, Ordering::Relaxed);
                debug!(candidate = raw, error = %e, "probe failed");
            }
        }
    }
}

/// Drives sources through the crawler and the per-candidate pipeline
#[derive(Clone)]
pub struct Harvester {
    crawler: ProxyCrawler,
    processor: ProxyProcessor,
}

impl Harvester {
    pub fn new(crawler: ProxyCrawler, processor: ProxyProcessor) -> Self {
        Self { crawler, processor }
    }

    /// Wire up the default network stack from configuration
    pub fn with_config(config: &Config) -> Result<Self> {
        let fetcher = HttpFetcher::with_config(config.crawler.clone())?;
        let checker = ProxyChecker::with_config(config.checker.clone());
        let classifier = AddressClassifier::from_lists(SPECIAL_IPS, RESERVED_NETWORKS)?;
        let processor = ProxyProcessor::new(
            classifier,
            Arc::new(checker),
            Arc::new(ProxyStore::new()),
        );
        Ok(Self::new(ProxyCrawler::new(Arc::new(fetcher)), processor))
    }

    /// Store holding everything accepted so far
    pub fn store(&self) -> &Arc<ProxyStore> {
        self.processor.store()
    }

    /// Process every source and wait for all candidate tasks to finish.
    ///
    /// Sources with an unsupported category are skipped. A failing source only
    /// loses its own candidates.
    pub async fn run(&self, sources: &[Source]) -> RunSummary {
        let start = Instant::now();
        let counters = Arc::new(Counters::default());
        let mut tasks = JoinSet::new();

        for (index, source) in sources.iter().enumerate() {
            if !source.category.is_supported() {
                warn!(index, category = %source.category, "proxy category not found");
                continue;
            }

            let harvester = self.clone();
            let counters = Arc::clone(&counters);
            let source = source.clone();
            tasks.spawn(async move { harvester.process_source(source, counters).await });
        }

        let scheduled = tasks.len();
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "source task aborted");
            }
        }

        let summary = RunSummary {
            sources: scheduled,
            failed_sources: counters.failed_sources.load(Ordering::Relaxed),
            candidates: counters.candidates.load(Ordering::Relaxed),
            stored: counters.stored.load(Ordering::Relaxed),
            duplicates: counters.duplicates.load(Ordering::Relaxed),
            rejected: counters.rejected.load(Ordering::Relaxed),
            probe_failures: counters.probe_failures.load(Ordering::Relaxed),
            aggregates: self.store().aggregate_count(),
            elapsed: start.elapsed(),
        };

        info!(
            proxies = summary.aggregates,
            stored = summary.stored,
            duplicates = summary.duplicates,
            rejected = summary.rejected,
            probe_failures = summary.probe_failures,
            failed_sources = summary.failed_sources,
            elapsed = ?summary.elapsed,
            "run complete"
        );

        summary
    }

    async fn process_source(&self, source: Source, counters: Arc<Counters>) {
        let candidates = match self.crawler.candidates(&source).await {
            Ok(candidates) => candidates,
            Err(e) => {
                counters.failed_sources.fetch_add(1, Ordering::Relaxed);
                warn!(url = %source.url, error = %e, "skipping source");
                return;
            }
        };

        info!(
            url = %source.url,
            category = %source.category,
            candidates = candidates.len(),
            "fetched source"
        );
        counters.candidates.fetch_add(candidates.len(), Ordering::Relaxed);

        let handles: Vec<_> = candidates
            .into_iter()
            .map(|raw| {
                let processor = self.processor.clone();
                let counters = Arc::clone(&counters);
                let category = source.category.clone();
                let is_checked = source.is_checked;
                tokio::spawn(async move {
                    let outcome = processor.process_proxy(&category, &raw, is_checked).await;
                    counters.record(&raw, &outcome);
                })
            })
            .collect();

        for joined in join_all(handles).await {
            if let Err(e) = joined {
                error!(url = %source.url, error = %e, "candidate task aborted");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProbeError, ProxyError};
    use crate::proxy::{Prober, ProxyAddress, ProxyType, SourceFetcher, SourceMethod};
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct MapFetcher(HashMap<String, String>);

    #[async_trait]
    impl SourceFetcher for MapFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            self.0
                .get(url)
                .map(|body| body.clone().into_bytes())
                .ok_or_else(|| ProxyError::SourceFetchFailure {
                    url: url.to_string(),
                    message: "connection refused".to_string(),
                })
        }
    }

    /// Accepts every proxy whose port is even
    struct EvenPortProber;

    #[async_trait]
    impl Prober for EvenPortProber {
        async fn check(&self, category: &ProxyType, address: &ProxyAddress) -> Result<ProxyRecord> {
            if address.port % 2 == 1 {
                return Err(ProbeError::Status(reqwest::StatusCode::BAD_GATEWAY).into());
            }
            let time_taken = if *category == ProxyType::Http { 0.2 } else { 0.5 };
            Ok(ProxyRecord::checked(
                category.clone(),
                address,
                time_taken,
                "2024-05-01T10:00:00+00:00".to_string(),
            ))
        }
    }

    fn harvester(entries: &[(&str, &str)]) -> Harvester {
        let map = entries
            .iter()
            .map(|(url, body)| (url.to_string(), body.to_string()))
            .collect();
        let processor = ProxyProcessor::new(
            AddressClassifier::default(),
            Arc::new(EvenPortProber),
            Arc::new(ProxyStore::new()),
        );
        Harvester::new(ProxyCrawler::new(Arc::new(MapFetcher(map))), processor)
    }

    #[tokio::test]
    async fn test_unchecked_list_source() {
        let harvester = harvester(&[("u1", "1.2.3.4:80\n5.6.7.8:81")]);
        let sources = vec![Source::new(SourceMethod::List, ProxyType::Http, "u1", false)];

        let summary = harvester.run(&sources).await;
        assert_eq!(summary.sources, 1);
        assert_eq!(summary.candidates, 2);
        assert_eq!(summary.stored, 2);
        assert_eq!(summary.aggregates, 2);

        let store = harvester.store();
        let mut http = store.http_classic_view();
        http.sort();
        assert_eq!(http, vec!["1.2.3.4:80", "5.6.7.8:81"]);

        let all = store.all_advanced_view();
        assert_eq!(all.len(), 2);
        for aggregate in &all {
            assert_eq!(aggregate.categories, vec![ProxyType::Http]);
            assert_eq!(aggregate.time_taken, 0.0);
            assert_eq!(aggregate.checked_at, "");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_checked_sources_merge_across_categories() {
        let harvester = harvester(&[
            ("http", "13.37.0.1:8080\n13.37.0.1:8080\n13.37.0.2:8081\n10.0.0.5:8080\ngarbage"),
            ("socks", "<td>13.37.0.1:8080</td> <td>13.37.0.3:1080</td>"),
        ]);
        let sources = vec![
            Source::new(SourceMethod::List, ProxyType::Http, "http", true),
            Source::new(SourceMethod::Scrap, ProxyType::Socks4, "socks", true),
        ];

        let summary = harvester.run(&sources).await;
        assert_eq!(summary.candidates, 7);
        assert_eq!(summary.stored, 3);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(summary.rejected, 2);
        assert_eq!(summary.probe_failures, 1);
        assert_eq!(summary.aggregates, 2);

        let all = harvester.store().all_advanced_view();
        assert_eq!(all[0].proxy, "13.37.0.1:8080");
        assert_eq!(all[0].categories, vec![ProxyType::Http, ProxyType::Socks4]);
        assert_eq!(all[0].time_taken, 0.2);
        assert_eq!(all[1].proxy, "13.37.0.3:1080");
        assert_eq!(harvester.store().socks4_classic_view().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_and_unsupported_sources_are_skipped() {
        let harvester = harvester(&[("ok", "13.37.0.4:3128")]);
        let sources = vec![
            Source::new(SourceMethod::List, ProxyType::Http, "missing", false),
            Source::new(SourceMethod::List, ProxyType::from("FTP"), "ok", false),
            Source::new(SourceMethod::Other("RSS".to_string()), ProxyType::Https, "ok", false),
            Source::new(SourceMethod::List, ProxyType::Socks5, "ok", false),
        ];

        let summary = harvester.run(&sources).await;
        assert_eq!(summary.sources, 3);
        assert_eq!(summary.failed_sources, 2);
        assert_eq!(summary.stored, 1);
        assert_eq!(harvester.store().socks5_classic_view(), vec!["13.37.0.4:3128"]);
        assert!(harvester.store().https_classic_view().is_empty());
    }

    #[tokio::test]
    async fn test_empty_run() {
        let harvester = harvester(&[]);
        let summary = harvester.run(&[]).await;
        assert_eq!(summary.sources, 0);
        assert_eq!(summary.aggregates, 0);
    }
}
