//! Thread-safe store of accepted proxies
//!
//! Keeps five (classic, advanced) view pairs: one global view that merges
//! every sighting of an address into a single aggregate, and one per protocol.
//! A single lock guards all of them; it is only held for an append and a
//! binary search, never across network I/O.

use crate::proxy::models::{ProxyAggregate, ProxyRecord, ProxyType};
use parking_lot::RwLock;

#[derive(Debug, Default)]
struct ProtocolView {
    classic: Vec<String>,
    advanced: Vec<ProxyRecord>,
}

#[derive(Debug, Default)]
struct Views {
    all_classic: Vec<String>,
    /// Sorted by address
    all_advanced: Vec<ProxyAggregate>,
    http: ProtocolView,
    https: ProtocolView,
    socks4: ProtocolView,
    socks5: ProtocolView,
}

impl Views {
    fn protocol(&self, category: &ProxyType) -> Option<&ProtocolView> {
        match category.as_str() {
            "HTTP" => Some(&self.http),
            "HTTPS" => Some(&self.https),
            "SOCKS4" => Some(&self.socks4),
            "SOCKS5" => Some(&self.socks5),
            _ => None,
        }
    }

    fn protocol_mut(&mut self, category: &ProxyType) -> Option<&mut ProtocolView> {
        match category.as_str() {
            "HTTP" => Some(&mut self.http),
            "HTTPS" => Some(&mut self.https),
            "SOCKS4" => Some(&mut self.socks4),
            "SOCKS5" => Some(&mut self.socks5),
            _ => None,
        }
    }

    fn merge_all(&mut self, record: &ProxyRecord) {
        match self
            .all_advanced
            .binary_search_by(|aggregate| aggregate.proxy.cmp(&record.proxy))
        {
            Ok(pos) => {
                let aggregate = &mut self.all_advanced[pos];
                // Only an HTTP measurement is treated as canonical timing;
                // checked_at stays with the first sighting.
                if record.category == ProxyType::Http && record.time_taken > 0.0 {
                    aggregate.time_taken = record.time_taken;
                }
                aggregate.add_category(&record.category);
            }
            Err(pos) => {
                self.all_classic.push(record.proxy.clone());
                self.all_advanced.insert(pos, ProxyAggregate::from_record(record));
            }
        }
    }
}

/// Aggregate store shared by every processing task
#[derive(Debug, Default)]
pub struct ProxyStore {
    views: RwLock<Views>,
}

impl ProxyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record to its protocol view and merge it into the global view.
    ///
    /// Records with an unrecognized category only reach the global view.
    pub fn store(&self, record: &ProxyRecord) {
        let mut views = self.views.write();

        if let Some(view) = views.protocol_mut(&record.category) {
            view.classic.push(record.proxy.clone());
            view.advanced.push(record.clone());
        }

        views.merge_all(record);
    }

    /// Every distinct address, in first-seen order
    pub fn all_classic_view(&self) -> Vec<String> {
        self.views.read().all_classic.clone()
    }

    /// Every distinct address merged across categories, sorted by address
    pub fn all_advanced_view(&self) -> Vec<ProxyAggregate> {
        self.views.read().all_advanced.clone()
    }

    /// Addresses stored under one protocol, in completion order
    pub fn classic_view(&self, category: &ProxyType) -> Vec<String> {
        self.views
            .read()
            .protocol(category)
            .map(|view| view.classic.clone())
            .unwrap_or_default()
    }

    /// Records stored under one protocol, in completion order
    pub fn advanced_view(&self, category: &ProxyType) -> Vec<ProxyRecord> {
        self.views
            .read()
            .protocol(category)
            .map(|view| view.advanced.clone())
            .unwrap_or_default()
    }

    pub fn http_classic_view(&self) -> Vec<String> {
        self.classic_view(&ProxyType::Http)
    }

    pub fn https_classic_view(&self) -> Vec<String> {
        self.classic_view(&ProxyType::Https)
    }

    pub fn socks4_classic_view(&self) -> Vec<String> {
        self.classic_view(&ProxyType::Socks4)
    }

    pub fn socks5_classic_view(&self) -> Vec<String> {
        self.classic_view(&ProxyType::Socks5)
    }

    pub fn http_advanced_view(&self) -> Vec<ProxyRecord> {
        self.advanced_view(&ProxyType::Http)
    }

    pub fn https_advanced_view(&self) -> Vec<ProxyRecord> {
        self.advanced_view(&ProxyType::Https)
    }

    pub fn socks4_advanced_view(&self) -> Vec<ProxyRecord> {
        self.advanced_view(&ProxyType::Socks4)
    }

    pub fn socks5_advanced_view(&self) -> Vec<ProxyRecord> {
        self.advanced_view(&ProxyType::Socks5)
    }

    /// Number of distinct addresses across all categories
    pub fn aggregate_count(&self) -> usize {
        self.views.read().all_advanced.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::models::ProxyAddress;
    use std::sync::Arc;

    fn record(category: ProxyType, proxy: &str, time_taken: f64) -> ProxyRecord {
        let (ip, port) = proxy.split_once(':').unwrap();
        let address = ProxyAddress::new(ip.to_string(), port.parse().unwrap());
        if time_taken > 0.0 {
            ProxyRecord::checked(category, &address, time_taken, "2024-05-01T10:00:00Z".to_string())
        } else {
            ProxyRecord::unchecked(category, &address)
        }
    }

    #[test]
    fn test_store_merges_categories() {
        let store = ProxyStore::new();
        store.store(&record(ProxyType::Http, "13.37.0.1:8080", 0.0));
        store.store(&record(ProxyType::Socks4, "13.37.0.1:8080", 0.0));

        let all = store.all_advanced_view();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].categories, vec![ProxyType::Http, ProxyType::Socks4]);
        assert_eq!(store.all_classic_view(), vec!["13.37.0.1:8080"]);
        assert_eq!(store.http_classic_view(), vec!["13.37.0.1:8080"]);
        assert_eq!(store.socks4_classic_view(), vec!["13.37.0.1:8080"]);
        assert!(store.https_classic_view().is_empty());
        assert!(store.socks5_advanced_view().is_empty());
    }

    #[test]
    fn test_categories_sorted_regardless_of_arrival() {
        let store = ProxyStore::new();
        store.store(&record(ProxyType::Socks5, "13.37.0.1:8080", 0.0));
        store.store(&record(ProxyType::Https, "13.37.0.1:8080", 0.0));
        store.store(&record(ProxyType::Http, "13.37.0.1:8080", 0.0));

        let all = store.all_advanced_view();
        assert_eq!(
            all[0].categories,
            vec![ProxyType::Http, ProxyType::Https, ProxyType::Socks5]
        );
    }

    #[test]
    fn test_http_timing_overrides_aggregate() {
        let store = ProxyStore::new();
        store.store(&record(ProxyType::Socks4, "13.37.0.1:8080", 0.5));
        store.store(&record(ProxyType::Http, "13.37.0.1:8080", 0.2));

        let all = store.all_advanced_view();
        assert_eq!(all[0].time_taken, 0.2);
    }

    #[test]
    fn test_http_timing_override_keeps_first_checked_at() {
        let address = ProxyAddress::new("13.37.0.1".to_string(), 8080);
        let store = ProxyStore::new();
        store.store(&ProxyRecord::checked(
            ProxyType::Socks4,
            &address,
            0.5,
            "2024-05-01T10:00:00Z".to_string(),
        ));
        store.store(&ProxyRecord::checked(
            ProxyType::Http,
            &address,
            0.2,
            "2024-05-01T10:05:00Z".to_string(),
        ));

        let all = store.all_advanced_view();
        assert_eq!(all[0].time_taken, 0.2);
        assert_eq!(all[0].checked_at, "2024-05-01T10:00:00Z");
        // the protocol view keeps the record as probed
        assert_eq!(store.http_advanced_view()[0].checked_at, "2024-05-01T10:05:00Z");
    }

    #[test]
    fn test_non_http_timing_does_not_override() {
        let store = ProxyStore::new();
        store.store(&record(ProxyType::Http, "13.37.0.1:8080", 0.2));
        store.store(&record(ProxyType::Https, "13.37.0.1:8080", 0.9));
        store.store(&record(ProxyType::Socks5, "13.37.0.1:8080", 0.7));

        let all = store.all_advanced_view();
        assert_eq!(all[0].time_taken, 0.2);
    }

    #[test]
    fn test_unchecked_http_does_not_override() {
        let store = ProxyStore::new();
        store.store(&record(ProxyType::Socks4, "13.37.0.1:8080", 0.5));
        store.store(&record(ProxyType::Http, "13.37.0.1:8080", 0.0));

        let all = store.all_advanced_view();
        assert_eq!(all[0].time_taken, 0.5);
        assert_eq!(all[0].checked_at, "2024-05-01T10:00:00Z");
    }

    #[test]
    fn test_global_view_sorted_by_address() {
        let store = ProxyStore::new();
        for proxy in ["45.77.1.2:80", "13.37.0.1:80", "23.1.1.1:3128", "13.37.0.1:8080"] {
            store.store(&record(ProxyType::Http, proxy, 0.0));
        }

        let addresses: Vec<String> = store
            .all_advanced_view()
            .into_iter()
            .map(|aggregate| aggregate.proxy)
            .collect();
        assert_eq!(
            addresses,
            vec!["13.37.0.1:80", "13.37.0.1:8080", "23.1.1.1:3128", "45.77.1.2:80"]
        );
        // classic global view keeps arrival order
        assert_eq!(
            store.all_classic_view(),
            vec!["45.77.1.2:80", "13.37.0.1:80", "23.1.1.1:3128", "13.37.0.1:8080"]
        );
    }

    #[test]
    fn test_unknown_category_only_reaches_global_view() {
        let store = ProxyStore::new();
        let other = ProxyType::Other("FTP".to_string());
        store.store(&record(other.clone(), "13.37.0.1:21", 0.0));

        assert_eq!(store.aggregate_count(), 1);
        assert_eq!(store.all_advanced_view()[0].categories, vec![other.clone()]);
        assert!(store.classic_view(&other).is_empty());
        assert!(store.advanced_view(&other).is_empty());
        for category in ProxyType::SUPPORTED {
            assert!(store.classic_view(&category).is_empty());
        }
    }

    #[test]
    fn test_concurrent_store() {
        let store = Arc::new(ProxyStore::new());
        let handles: Vec<_> = ProxyType::SUPPORTED
            .into_iter()
            .map(|category| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        store.store(&record(category.clone(), &format!("13.37.1.{}:80", i), 0.0));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let all = store.all_advanced_view();
        assert_eq!(all.len(), 50);
        assert_eq!(store.all_classic_view().len(), 50);
        assert!(all.iter().all(|aggregate| aggregate.categories.len() == 4));
        assert!(all.windows(2).all(|pair| pair[0].proxy < pair[1].proxy));
        assert_eq!(store.socks5_advanced_view().len(), 50);
    }
}
