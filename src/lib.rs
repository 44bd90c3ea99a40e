// src/lib.rs
// =============================================================================
// web-spider: a breadth-first web crawler.
//
// Module layout:
// - crawl: the concurrent crawl engine (frontier, dedup, workers, ...)
// - page: URL normalization, HTTP fetching and HTML parsing
// - store: where accepted pages end up
// - error: error types shared by all of the above
// - logging: tracing subscriber setup for the binary
// =============================================================================

pub mod crawl;
pub mod error;
pub mod logging;
pub mod page;
pub mod store;

#[cfg(test)]
mod testing;

pub use crawl::{CrawlConfig, Crawler, StatsReport};
pub use error::CrawlError;
