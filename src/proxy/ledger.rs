//! At-most-once claims on (category, proxy) pairs

use crate::proxy::models::ProxyType;
use dashmap::DashSet;

/// Concurrent record of every (category, proxy) pair claimed this run.
///
/// Entries are write-once and never removed.
#[derive(Debug, Default)]
pub struct DedupLedger {
    claimed: DashSet<String>,
}

impl DedupLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger key for a pair, e.g. `HTTP_1.2.3.4:80`
    pub fn key(category: &ProxyType, proxy: &str) -> String {
        format!("{}_{}", category, proxy)
    }

    /// Atomically claim a pair. Only the first caller gets `true`.
    pub fn claim(&self, category: &ProxyType, proxy: &str) -> bool {
        self.claimed.insert(Self::key(category, proxy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_claim_once() {
        let ledger = DedupLedger::new();
        assert!(ledger.claim(&ProxyType::Http, "1.2.3.4:80"));
        assert!(!ledger.claim(&ProxyType::Http, "1.2.3.4:80"));
        assert!(!ledger.claim(&ProxyType::Http, "1.2.3.4:80"));
    }

    #[test]
    fn test_categories_claim_independently() {
        let ledger = DedupLedger::new();
        assert!(ledger.claim(&ProxyType::Http, "1.2.3.4:80"));
        assert!(ledger.claim(&ProxyType::Socks4, "1.2.3.4:80"));
        assert!(ledger.claim(&ProxyType::Https, "1.2.3.4:80"));
        assert_eq!(DedupLedger::key(&ProxyType::Socks4, "1.2.3.4:80"), "SOCKS4_1.2.3.4:80");
    }

    #[test]
    fn test_concurrent_claims_have_one_winner() {
        let ledger = Arc::new(DedupLedger::new());
        let wins = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                let wins = Arc::clone(&wins);
                std::thread::spawn(move || {
                    if ledger.claim(&ProxyType::Socks5, "13.37.0.1:1080") {
                        wins.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(wins.load(Ordering::SeqCst), 1);
    }
}
