//! Proxy data models

use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Proxy category.
///
/// Labels are case-sensitive (`HTTP`, `HTTPS`, `SOCKS4`, `SOCKS5`). Any other
/// label is carried verbatim in `Other` so it can still be merged into the
/// global view. Equality, ordering and hashing all go through the label, so
/// `Other("HTTP")` and `Http` are the same category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProxyType {
    Http,
    Https,
    Socks4,
    Socks5,
    Other(String),
}

impl ProxyType {
    /// The four categories that take part in probing and per-protocol views.
    pub const SUPPORTED: [ProxyType; 4] = [
        ProxyType::Http,
        ProxyType::Https,
        ProxyType::Socks4,
        ProxyType::Socks5,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ProxyType::Http => "HTTP",
            ProxyType::Https => "HTTPS",
            ProxyType::Socks4 => "SOCKS4",
            ProxyType::Socks5 => "SOCKS5",
            ProxyType::Other(label) => label.as_str(),
        }
    }

    /// Lowercase URL scheme used to address a proxy of this category
    pub fn scheme(&self) -> String {
        self.as_str().to_lowercase()
    }

    pub fn is_supported(&self) -> bool {
        ProxyType::SUPPORTED.contains(self)
    }
}

impl From<String> for ProxyType {
    fn from(label: String) -> Self {
        match label.as_str() {
            "HTTP" => ProxyType::Http,
            "HTTPS" => ProxyType::Https,
            "SOCKS4" => ProxyType::Socks4,
            "SOCKS5" => ProxyType::Socks5,
            _ => ProxyType::Other(label),
        }
    }
}

impl From<&str> for ProxyType {
    fn from(label: &str) -> Self {
        ProxyType::from(label.to_string())
    }
}

impl From<ProxyType> for String {
    fn from(proxy_type: ProxyType) -> Self {
        match proxy_type {
            ProxyType::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl PartialEq for ProxyType {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for ProxyType {}

impl Hash for ProxyType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

// Categories order by label so an aggregate's membership reads alphabetically.
impl Ord for ProxyType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl PartialOrd for ProxyType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ProxyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How candidates are pulled out of a fetched source body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SourceMethod {
    /// One candidate per line
    List,
    /// Every `ip:port` looking substring
    Scrap,
    Other(String),
}

impl SourceMethod {
    pub fn as_str(&self) -> &str {
        match self {
            SourceMethod::List => "LIST",
            SourceMethod::Scrap => "SCRAP",
            SourceMethod::Other(method) => method.as_str(),
        }
    }
}

impl From<String> for SourceMethod {
    fn from(method: String) -> Self {
        match method.as_str() {
            "LIST" => SourceMethod::List,
            "SCRAP" => SourceMethod::Scrap,
            _ => SourceMethod::Other(method),
        }
    }
}

impl From<SourceMethod> for String {
    fn from(method: SourceMethod) -> Self {
        match method {
            SourceMethod::Other(method) => method,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for SourceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proxy list published somewhere on the web
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub method: SourceMethod,
    pub category: ProxyType,
    pub url: String,
    /// Whether candidates from this source must pass a live probe.
    #[serde(default = "default_is_checked", deserialize_with = "checked_or_default")]
    pub is_checked: bool,
}

impl Source {
    pub fn new(method: SourceMethod, category: ProxyType, url: &str, is_checked: bool) -> Self {
        Self {
            method,
            category,
            url: url.to_string(),
            is_checked,
        }
    }
}

fn default_is_checked() -> bool {
    true
}

fn checked_or_default<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or_else(default_is_checked))
}

/// A validated `ip:port` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyAddress {
    pub ip: String,
    pub port: u16,
}

impl ProxyAddress {
    pub fn new(ip: String, port: u16) -> Self {
        Self { ip, port }
    }

    /// Get the proxy string in IP:PORT format
    pub fn to_simple_string(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }

    /// Get the proxy URL for the given category, e.g. `socks5://1.2.3.4:1080`
    pub fn url(&self, proxy_type: &ProxyType) -> String {
        format!("{}://{}:{}", proxy_type.scheme(), self.ip, self.port)
    }
}

impl fmt::Display for ProxyAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

/// One proxy accepted under one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyRecord {
    pub category: ProxyType,
    pub proxy: String,
    pub ip: String,
    pub port: u16,
    /// Probe round trip in seconds, 0 when the proxy was not live-checked
    pub time_taken: f64,
    /// RFC 3339 completion time of the probe, empty when not checked
    pub checked_at: String,
}

impl ProxyRecord {
    /// Record for a proxy that passed a live probe
    pub fn checked(
        category: ProxyType,
        address: &ProxyAddress,
        time_taken: f64,
        checked_at: String,
    ) -> Self {
        Self {
            category,
            proxy: address.to_simple_string(),
            ip: address.ip.clone(),
            port: address.port,
            time_taken,
            checked_at,
        }
    }

    /// Record for a proxy from a trusted source, accepted without probing
    pub fn unchecked(category: ProxyType, address: &ProxyAddress) -> Self {
        Self::checked(category, address, 0.0, String::new())
    }
}

/// One address merged across every category it was seen under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyAggregate {
    pub proxy: String,
    pub ip: String,
    pub port: u16,
    pub time_taken: f64,
    pub checked_at: String,
    /// Sorted and duplicate free
    pub categories: Vec<ProxyType>,
}

impl ProxyAggregate {
    pub fn from_record(record: &ProxyRecord) -> Self {
        Self {
            proxy: record.proxy.clone(),
            ip: record.ip.clone(),
            port: record.port,
            time_taken: record.time_taken,
            checked_at: record.checked_at.clone(),
            categories: vec![record.category.clone()],
        }
    }

    /// Insert a category at its sorted position. Returns false if present.
    pub fn add_category(&mut self, category: &ProxyType) -> bool {
        match self.categories.binary_search(category) {
            Ok(_) => false,
            Err(pos) => {
                self.categories.insert(pos, category.clone());
                true
            }
        }
    }

    /// Categories joined by `,`, as written to CSV
    pub fn categories_label(&self) -> String {
        self.categories
            .iter()
            .map(ProxyType::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}
