//! Static defaults and source list loading

use crate::error::{ProxyError, Result};
use crate::proxy::models::Source;

/// Addresses that are never probed even though they are publicly routable.
pub const SPECIAL_IPS: &[&str] = &[
    "0.0.0.0",
    "1.0.0.1",
    "1.1.1.1",
    "255.255.255.255",
    "8.8.4.4",
    "8.8.8.8",
    "9.9.9.9",
];

/// IANA special-purpose IPv4 blocks
pub const RESERVED_NETWORKS: &[&str] = &[
    "0.0.0.0/8",       // "this" network
    "10.0.0.0/8",      // private range A
    "100.64.0.0/10",   // carrier-grade NAT
    "127.0.0.0/8",     // loopback
    "169.254.0.0/16",  // link-local
    "172.16.0.0/12",   // private range B
    "192.0.0.0/24",    // IETF protocol assignments
    "192.0.2.0/24",    // TEST-NET-1
    "192.168.0.0/16",  // private range C
    "198.18.0.0/15",   // benchmarking
    "198.51.100.0/24", // TEST-NET-2
    "203.0.113.0/24",  // TEST-NET-3
    "224.0.0.0/4",     // multicast
    "240.0.0.0/4",     // reserved
];

/// Reachability targets for HTTP, SOCKS4 and SOCKS5 probes
pub const HTTP_TESTING_SITES: &[&str] = &[
    "http://ifconfig.me/ip",
    "http://api.ipaddress.com/myip",
    "http://checkip.amazonaws.com",
];

/// Reachability targets for HTTPS probes
pub const HTTPS_TESTING_SITES: &[&str] = &[
    "https://ifconfig.me/ip",
    "https://api.ipaddress.com/myip",
    "https://checkip.amazonaws.com",
    "https://google.com",
    "https://bing.com",
    "https://yahoo.com",
    "https://api.ipify.org",
    "https://ipinfo.io/ip",
];

pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0",
];

pub fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

/// Parse the JSON source list.
///
/// A missing or blank value is fatal, as are malformed JSON and an empty list.
pub fn load_sources(raw: Option<&str>) -> Result<Vec<Source>> {
    let raw = raw
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .ok_or_else(|| ProxyError::SourceConfig("PROXY_RESOURCES not found".to_string()))?;

    let sources: Vec<Source> = serde_json::from_str(raw)
        .map_err(|e| ProxyError::SourceConfig(format!("error parsing JSON: {}", e)))?;
    if sources.is_empty() {
        return Err(ProxyError::SourceConfig("no sources configured".to_string()));
    }

    Ok(sources)
}
