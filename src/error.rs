// src/error.rs
// =============================================================================
// Error types shared by the crawl engine and its collaborators.
//
// The engine splits failures into two groups:
// - Per-URL errors (normalize, fetch, parse, store): logged, the URL is
//   skipped, the crawl keeps going. Nothing here is ever retried.
// - Fatal preconditions (CrawlError): the run refuses to start.
// =============================================================================

use std::time::Duration;
use thiserror::Error;

/// A URL that could not be canonicalized.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("malformed URL '{url}': {source}")]
    Malformed {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("URL has no host: {0}")]
    MissingHost(String),
}

/// Why a page could not be downloaded.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
    #[error("non-OK HTTP status {0}")]
    Status(u16),
    #[error("unsupported content type '{0}'")]
    UnsupportedContentType(String),
    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),
}

impl FetchError {
    /// Only non-OK statuses count towards the HTTP error rate.
    pub fn is_http_error(&self) -> bool {
        matches!(self, FetchError::Status(_))
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid page URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not serialize page: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("storage sink unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrontierError {
    #[error("dequeue from an empty frontier")]
    Empty,
}

/// Conditions that stop a crawl before any work begins.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("storage sink is not reachable: {0}")]
    SinkUnavailable(#[source] StoreError),
    #[error("invalid seed URL: {0}")]
    InvalidSeed(#[source] NormalizeError),
    #[error("invalid crawl configuration: {0}")]
    InvalidConfig(String),
}
