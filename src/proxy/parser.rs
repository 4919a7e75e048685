//! Proxy parser module for validating candidates and extracting them from
//! source bodies

use crate::error::{ProxyError, Result};
use crate::proxy::models::{ProxyAddress, SourceMethod};
use once_cell::sync::Lazy;
use regex::Regex;

/// Strict IPv4:port, no leading zeros on the port
static PROXY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^((25[0-5]|2[0-4][0-9]|[0-1]?[0-9][0-9]?)\.){3}(25[0-5]|2[0-4][0-9]|[0-1]?[0-9][0-9]?):(0|[1-9][0-9]{0,4})$",
    )
    .expect("Invalid proxy regex")
});

/// Loose IP:PORT matcher used to scrape HTML or free text
static SCRAP_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+(?:\.[0-9]+){3}:[0-9]+").expect("Invalid scrap regex"));

/// Proxy parser for raw candidate tokens
pub struct ProxyParser;

impl ProxyParser {
    /// Normalize and validate a raw `ip:port` token
    pub fn validate(raw: &str) -> Result<ProxyAddress> {
        let proxy = raw.replace(['\r', '\n'], "");
        let proxy = proxy.trim();
        if proxy.is_empty() {
            return Err(ProxyError::EmptyCandidate);
        }

        let parts: Vec<&str> = proxy.split(':').collect();
        let [ip, port] = parts.as_slice() else {
            return Err(ProxyError::MalformedAddress(proxy.to_string()));
        };

        if !PROXY_REGEX.is_match(proxy) {
            return Err(ProxyError::PatternMismatch(proxy.to_string()));
        }

        let port: u16 = port
            .parse()
            .map_err(|_| ProxyError::InvalidPort(proxy.to_string()))?;

        Ok(ProxyAddress::new(ip.to_string(), port))
    }

    /// Pull raw candidates out of a fetched source body
    pub fn extract(method: &SourceMethod, body: &str) -> Result<Vec<String>> {
        match method {
            SourceMethod::List => Ok(body.trim().split('\n').map(str::to_string).collect()),
            SourceMethod::Scrap => Ok(SCRAP_REGEX
                .find_iter(body)
                .map(|m| m.as_str().to_string())
                .collect()),
            SourceMethod::Other(method) => {
                Err(ProxyError::SourceMethodUnsupported(method.clone()))
            }
        }
    }
}
