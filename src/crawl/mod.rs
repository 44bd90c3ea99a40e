// src/crawl/mod.rs
// =============================================================================
// This module holds the concurrent crawl engine.
//
// Pieces, leaf-first:
// - frontier: FIFO of pending URLs plus a processed counter
// - dedup: fingerprint set answering "seen this URL already?"
// - stats: atomic counters, time series and the periodic sampler
// - context: run configuration and the state shared by all tasks
// - dispatcher: feeds the frontier into the bounded job channel
// - worker: the per-URL pipeline and the worker loop
// - coordinator: waits for every worker before finalizing the stats
// - engine: puts it all together (concurrent and sequential runs)
// =============================================================================

mod context;
mod coordinator;
mod dedup;
mod dispatcher;
mod engine;
mod frontier;
mod stats;
mod worker;

pub use context::{CrawlConfig, CrawlContext};
pub use coordinator::TerminationCoordinator;
pub use dedup::{fingerprint, DedupFilter};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use engine::Crawler;
pub use frontier::Frontier;
pub use stats::{Counter, CounterSnapshot, CrawlerStats, Ratios, Sample, Sampler, StatsReport};
pub use worker::{process_url, PageOutcome, Worker};
