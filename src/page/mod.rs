// src/page/mod.rs
// =============================================================================
// Everything the crawl engine needs to turn a URL into a Page.
//
// Submodules:
// - normalize: canonical form of a URL (the dedup and storage key)
// - http: downloads HTML over HTTP
// - html: parses HTML into a Page (title, text, outbound links)
//
// The engine only talks to the `Fetcher` and `PageParser` traits, so tests
// can swap in deterministic stubs for the network.
// =============================================================================

mod html;
mod http;
mod normalize;

pub use html::{HtmlParser, Page, PageParser};
pub use http::{Fetcher, HttpFetcher};
pub use normalize::normalize_url;
