// src/testing.rs
// Deterministic collaborators for the engine tests. Compiled for tests only.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{FetchError, StoreError};
use crate::page::{Fetcher, Page};
use crate::store::{PageSink, StoreOutcome};

#[derive(Debug, Clone)]
enum StubResponse {
    Page(String),
    Error(FetchError),
    Hang,
}

/// Fetcher answering from a fixed URL -> response table.
/// Unknown URLs get a 404.
#[derive(Debug, Clone, Default)]
pub struct StubFetcher {
    responses: HashMap<String, StubResponse>,
    calls: Arc<AtomicUsize>,
}

impl StubFetcher {
    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.responses.insert(url.to_string(), StubResponse::Page(html.to_string()));
        self
    }

    pub fn with_error(mut self, url: &str, error: FetchError) -> Self {
        self.responses.insert(url.to_string(), StubResponse::Error(error));
        self
    }

    /// The fetch for `url` never completes.
    pub fn with_hang(mut self, url: &str) -> Self {
        self.responses.insert(url.to_string(), StubResponse::Hang);
        self
    }

    /// Shared call counter; clones of this fetcher count into the same one.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match self.responses.get(url) {
            Some(StubResponse::Page(html)) => Ok(html.clone()),
            Some(StubResponse::Error(e)) => Err(e.clone()),
            Some(StubResponse::Hang) => std::future::pending().await,
            None => Err(FetchError::Status(404)),
        }
    }
}

/// Sink that already "has" every page.
#[derive(Debug, Default)]
pub struct DuplicateSink;

#[async_trait]
impl PageSink for DuplicateSink {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn store(&self, _page: &Page) -> Result<StoreOutcome, StoreError> {
        Ok(StoreOutcome::DuplicateKey)
    }
}

/// Sink that answers its startup ping but fails every store, like a
/// database that went away mid-crawl.
#[derive(Debug, Default)]
pub struct FailingSink;

#[async_trait]
impl PageSink for FailingSink {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn store(&self, _page: &Page) -> Result<StoreOutcome, StoreError> {
        Err(StoreError::Unavailable("connection reset".to_string()))
    }
}

/// A minimal HTML document. Links sit inside <nav> so they do not add to
/// the page text.
pub fn page_html(title: &str, text: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|link| format!(r#"<a href="{}">link</a>"#, link))
        .collect();

    format!(
        "<html><head><title>{}</title></head><body><nav>{}</nav><p>{}</p></body></html>",
        title, anchors, text
    )
}

pub fn tree_url(i: usize) -> String {
    format!("https://example.com/{}", i)
}

/// `pages` pages shaped like a binary tree: page i links to 2i+1 and 2i+2
/// (when they exist) and back to the root.
pub fn tree_site(pages: usize) -> StubFetcher {
    let mut fetcher = StubFetcher::default();

    for i in 0..pages {
        let mut links = vec![tree_url(0)];
        for child in [2 * i + 1, 2 * i + 2] {
            if child < pages {
                links.push(tree_url(child));
            }
        }
        let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();
        let html = page_html(&format!("Page {}", i), "some text", &link_refs);
        fetcher = fetcher.with_page(&tree_url(i), &html);
    }

    fetcher
}
