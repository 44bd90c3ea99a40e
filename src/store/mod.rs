// src/store/mod.rs
// =============================================================================
// Persistence sinks for accepted pages.
//
// A sink is mandatory infrastructure: the engine pings it before the crawl
// starts and refuses to run if it is unreachable. After that, a failed
// store only costs the one page.
//
// Submodules:
// - jsonl: appends pages to a JSON Lines file, URL is the unique key
// - memory: keeps pages in memory (tests and dry runs)
// =============================================================================

mod jsonl;
mod memory;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::page::Page;

pub use jsonl::JsonlSink;
pub use memory::MemorySink;

/// What happened to a page handed to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    Inserted,
    /// A page with the same URL is already stored.
    DuplicateKey,
}

#[async_trait]
pub trait PageSink: Send + Sync {
    /// Checks that the sink can accept writes.
    async fn ping(&self) -> Result<(), StoreError>;

    async fn store(&self, page: &Page) -> Result<StoreOutcome, StoreError>;
}
