// src/store/memory.rs
// In-memory sink: used by tests and by `--dry-run`.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;

use super::{PageSink, StoreOutcome};
use crate::error::StoreError;
use crate::page::Page;

#[derive(Debug, Default)]
pub struct MemorySink {
    stored: Mutex<Stored>,
    unavailable: bool,
}

// Pages in insertion order, plus their URLs for the unique-key check.
#[derive(Debug, Default)]
struct Stored {
    pages: Vec<Page>,
    urls: HashSet<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that fails its startup ping and every store.
    pub fn unavailable() -> Self {
        Self {
            stored: Mutex::default(),
            unavailable: true,
        }
    }

    pub fn pages(&self) -> Vec<Page> {
        self.stored.lock().pages.clone()
    }

    pub fn len(&self) -> usize {
        self.stored.lock().pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stored.lock().pages.is_empty()
    }
}

#[async_trait]
impl PageSink for MemorySink {
    async fn ping(&self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("memory sink is offline".to_string()));
        }
        Ok(())
    }

    async fn store(&self, page: &Page) -> Result<StoreOutcome, StoreError> {
        self.ping().await?;

        let mut stored = self.stored.lock();
        if !stored.urls.insert(page.url.clone()) {
            return Ok(StoreOutcome::DuplicateKey);
        }
        stored.pages.push(page.clone());
        Ok(StoreOutcome::Inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(url: &str) -> Page {
        Page {
            url: url.to_string(),
            title: "Title".to_string(),
            text: "text".to_string(),
            links: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_keeps_insertion_order_and_rejects_repeats() {
        let sink = MemorySink::new();

        for url in ["https://b.com/", "https://a.com/", "https://c.com/"] {
            assert_eq!(sink.store(&page(url)).await.unwrap(), StoreOutcome::Inserted);
        }
        let again = sink.store(&page("https://a.com/")).await.unwrap();

        assert_eq!(again, StoreOutcome::DuplicateKey);
        let urls: Vec<String> = sink.pages().into_iter().map(|p| p.url).collect();
        assert_eq!(urls, vec!["https://b.com/", "https://a.com/", "https://c.com/"]);
    }

    #[tokio::test]
    async fn test_unavailable_sink_fails_ping_and_store() {
        let sink = MemorySink::unavailable();

        assert!(matches!(sink.ping().await, Err(StoreError::Unavailable(_))));
        assert!(sink.store(&page("https://a.com/")).await.is_err());
        assert!(sink.is_empty());
    }
}
