// src/page/http.rs
// =============================================================================
// Downloads pages over HTTP.
//
// Key functionality:
// - One shared reqwest client (connection pooling) with a request timeout
// - Only a 200 response with an HTML content type is accepted
// - reqwest errors are mapped to a small FetchError taxonomy
//
// Nothing here retries: every fetch is single-shot, and the caller decides
// what a failure means for its counters.
// =============================================================================

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use std::time::Duration;

use crate::error::FetchError;

const USER_AGENT: &str = concat!("web-spider/", env!("CARGO_PKG_VERSION"));

/// Source of raw page content.
///
/// Implementations must only return content that is HTML.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Fetcher backed by a real HTTP client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Builds a fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self::with_client(client, timeout))
    }

    /// Wraps an already configured client.
    pub fn with_client(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    // Maps reqwest's error kinds onto FetchError.
    //
    // reqwest errors can happen for many reasons:
    // - Network timeout
    // - DNS resolution failure
    // - SSL certificate issues
    // - Too many redirects
    fn categorize_error(&self, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            return FetchError::Timeout(self.timeout);
        }

        let error_string = error.to_string();
        let message = if error.is_redirect() {
            "too many redirects".to_string()
        } else if error.is_connect() {
            if error_string.contains("dns") {
                "could not resolve hostname".to_string()
            } else {
                "connection failed".to_string()
            }
        } else if error_string.contains("certificate") || error_string.contains("ssl") {
            "SSL certificate error".to_string()
        } else {
            error_string
        };

        FetchError::Network(message)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.categorize_error(e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !content_type.contains("text/html") {
            return Err(FetchError::UnsupportedContentType(content_type));
        }

        response.text().await.map_err(|e| self.categorize_error(e))
    }
}
