//! Special address classification
//!
//! Decides whether a candidate IP must be excluded from probing: explicitly
//! blocked addresses, anything that does not parse, and the IANA
//! special-purpose IPv4 blocks.

use crate::config::{RESERVED_NETWORKS, SPECIAL_IPS};
use crate::error::{ProxyError, Result};
use ipnet::Ipv4Net;
use std::net::IpAddr;

/// Classifier for addresses that must never be probed
#[derive(Debug, Clone)]
pub struct AddressClassifier {
    /// Kept sorted for binary search
    special_ips: Vec<String>,
    reserved: Vec<Ipv4Net>,
}

impl AddressClassifier {
    pub fn new(mut special_ips: Vec<String>, reserved: Vec<Ipv4Net>) -> Self {
        special_ips.sort();
        special_ips.dedup();
        Self {
            special_ips,
            reserved: reserved.iter().map(Ipv4Net::trunc).collect(),
        }
    }

    /// Build a classifier from textual block lists, e.g. `"10.0.0.0/8"`
    pub fn from_lists(special_ips: &[&str], reserved: &[&str]) -> Result<Self> {
        let reserved = reserved
            .iter()
            .map(|network| {
                network
                    .parse::<Ipv4Net>()
                    .map_err(|e| ProxyError::InvalidNetwork(format!("{}: {}", network, e)))
            })
            .collect::<Result<Vec<_>>>()?;
        let special_ips = special_ips.iter().map(|ip| ip.to_string()).collect();
        Ok(Self::new(special_ips, reserved))
    }

    /// Check whether `ip` is special. Unparsable input counts as special.
    pub fn is_special(&self, ip: &str) -> bool {
        if self
            .special_ips
            .binary_search_by(|probe| probe.as_str().cmp(ip))
            .is_ok()
        {
            return true;
        }

        let Ok(address) = ip.parse::<IpAddr>() else {
            return true;
        };
        if address.is_loopback() || address.is_multicast() || address.is_unspecified() {
            return true;
        }

        match address {
            IpAddr::V4(v4) => self.reserved.iter().any(|net| net.contains(&v4)),
            IpAddr::V6(_) => false,
        }
    }
}

impl Default for AddressClassifier {
    fn default() -> Self {
        let reserved = RESERVED_NETWORKS
            .iter()
            .filter_map(|network| network.parse::<Ipv4Net>().ok())
            .collect();
        let special_ips = SPECIAL_IPS.iter().map(|ip| ip.to_string()).collect();
        Self::new(special_ips, reserved)
    }
}
