//! Error types for proxy harvesting

use thiserror::Error;

/// Failure while probing a single proxy.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The proxy URL could not be turned into a reqwest proxy.
    #[error("error parsing proxy URL: {0}")]
    ProxyUrl(#[source] reqwest::Error),

    /// The per-probe HTTP client could not be built.
    #[error("error creating client: {0}")]
    Client(#[source] reqwest::Error),

    /// Connection, TLS, timeout or any other transport failure.
    #[error("request error: {0}")]
    Request(#[source] reqwest::Error),

    /// The testing site answered with something other than 200.
    #[error("unexpected status code {0}")]
    Status(reqwest::StatusCode),

    #[error("no testing site configured")]
    NoTestingSite,

    #[error("probe gate closed")]
    GateClosed,
}

/// Proxy harvesting error type.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("proxy not found")]
    EmptyCandidate,

    /// Token does not split into exactly `ip` and `port`.
    #[error("proxy format incorrect: {0}")]
    MalformedAddress(String),

    /// Token has two parts but is not a strict IPv4:port.
    #[error("proxy format not match: {0}")]
    PatternMismatch(String),

    #[error("proxy port format incorrect: {0}")]
    InvalidPort(String),

    #[error("proxy belongs to special ip: {0}")]
    SpecialAddress(String),

    /// The (category, proxy) pair was already claimed during this run.
    #[error("proxy has been processed: {0}")]
    AlreadyProcessed(String),

    #[error("proxy category {0} not supported")]
    UnsupportedCategory(String),

    #[error("probe failed: {0}")]
    ProbeFailure(#[from] ProbeError),

    #[error("error fetching source {url}: {message}")]
    SourceFetchFailure { url: String, message: String },

    #[error("source method not found: {0}")]
    SourceMethodUnsupported(String),

    /// Missing or unreadable source configuration. Fatal to the run.
    #[error("source configuration error: {0}")]
    SourceConfig(String),

    /// A reserved network entry is not valid CIDR notation.
    #[error("invalid network: {0}")]
    InvalidNetwork(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ProxyError {
    /// True for the expected "already claimed" outcome of concurrent fan-out.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, ProxyError::AlreadyProcessed(_))
    }

    /// True when the candidate was rejected before any network activity.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ProxyError::EmptyCandidate
                | ProxyError::MalformedAddress(_)
                | ProxyError::PatternMismatch(_)
                | ProxyError::InvalidPort(_)
                | ProxyError::SpecialAddress(_)
                | ProxyError::UnsupportedCategory(_)
        )
    }
}

/// Result type for proxy harvesting operations.
pub type Result<T> = std::result::Result<T, ProxyError>;
