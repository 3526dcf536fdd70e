//! Error taxonomy.
//!
//! None of these abort the page. A [`ConfigError`] skips one map instance,
//! a [`DataError`] drops one value or pin, and a [`ResourceError`] is
//! replaced by a safe default. Callers log and continue.

/// A map instance cannot be configured.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing access token")]
    MissingToken,
    #[error("invalid JSON overrides: {0}")]
    InvalidOverrides(#[from] serde_json::Error),
}

/// An authored value could not be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataError {
    #[error("{attribute}: not a number: {value:?}")]
    InvalidNumber { attribute: &'static str, value: String },
    #[error("{attribute}: not text: {value}")]
    InvalidText { attribute: &'static str, value: String },
    #[error("{attribute}: not a coordinate pair: {value:?}")]
    InvalidPair { attribute: &'static str, value: String },
    #[error("unknown popup anchor: {0:?}")]
    UnknownAnchor(String),
    #[error("unknown initial-center strategy: {0:?}")]
    UnknownStrategy(String),
    #[error("unknown popup mode: {0:?}")]
    UnknownPopupMode(String),
}

/// An asynchronous engine request failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceError {
    #[error("icon {url} failed to load: {reason}")]
    IconLoad { url: String, reason: String },
    #[error("expansion zoom for cluster {cluster_id} failed: {reason}")]
    ExpansionZoom { cluster_id: u64, reason: String },
}
