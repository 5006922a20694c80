// src/error.rs
use thiserror::Error;

/// Page could not be retrieved. Fatal to the current cycle only.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("GET {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("GET {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// The page no longer has the structure the extraction rule expects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("no element matches `{selector}`")]
    MarkerNotFound { selector: String },
    #[error("`{selector}` has {found} table row(s), need at least 2")]
    MissingRows { selector: String, found: usize },
    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("state file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("state file {path} is not a JSON object: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("unsupported state store url `{0}`")]
    UnsupportedUrl(String),
}

/// Mail could not be built or the transport rejected it.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("invalid mailbox `{address}`: {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },
    #[error("build email: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("smtp: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// Startup configuration problem. The process must not start.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing env var: {0}")]
    Missing(&'static str),
    #[error("env var {name} has invalid value `{value}`: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error("reading sources from {path}: {source}")]
    SourcesIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing sources from {path}: {source}")]
    SourcesToml {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("source `{name}`: {reason}")]
    Source { name: String, reason: String },
}

/// Everything that can end a single watcher cycle early.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

impl CycleError {
    /// Short label used for log fields and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            CycleError::Fetch(_) => "fetch",
            CycleError::Extraction(_) => "extraction",
            CycleError::Store(_) => "store",
            CycleError::Delivery(_) => "delivery",
        }
    }
}
