// src/crawl/worker.rs
// =============================================================================
// Workers and the per-URL pipeline.
//
// Each worker pulls URLs from the shared job channel until it is closed and
// drained, then sends exactly one completion signal. For every URL:
//
// 1. normalize again (jobs may not have come through normalization)
// 2. fetch (under a deadline)
// 3. parse
// 4. validate: needs a title, and either text or links
// 5. store; a stored page is recorded in the dedup filter
// 6. queue every outbound link the dedup filter has not seen, until the
//    enqueue cap is reached
//
// Any failure in 1-3 skips just this URL. Nothing is retried.
// =============================================================================

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::context::{CrawlContext, JobGuard};
use crate::error::FetchError;
use crate::page::{normalize_url, Page};
use crate::store::StoreOutcome;

/// What happened to one URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    Malformed,
    FetchFailed,
    ParseFailed,
    /// Rejected: the page has no title.
    Untitled,
    /// Rejected: no text and no links.
    Empty,
    Processed {
        stored: bool,
        enqueued: usize,
    },
}

pub struct Worker {
    id: usize,
    ctx: Arc<CrawlContext>,
    jobs: flume::Receiver<String>,
    done: mpsc::Sender<usize>,
}

impl Worker {
    pub fn new(
        id: usize,
        ctx: Arc<CrawlContext>,
        jobs: flume::Receiver<String>,
        done: mpsc::Sender<usize>,
    ) -> Self {
        Self { id, ctx, jobs, done }
    }

    pub async fn run(self) {
        let mut handled = 0usize;

        // recv_async only fails once every sender is gone AND the buffer is
        // empty, so this loop drains whatever the dispatcher left behind.
        while let Ok(url) = self.jobs.recv_async().await {
            let _job = JobGuard::new(&self.ctx);
            let outcome = process_url(&self.ctx, &url).await;
            debug!(worker = self.id, %url, ?outcome, "job finished");
            handled += 1;
        }

        info!(worker = self.id, handled, "worker finished");
        if self.done.send(self.id).await.is_err() {
            warn!(worker = self.id, "termination coordinator is gone");
        }
    }
}

/// Runs the whole pipeline for one URL.
pub async fn process_url(ctx: &CrawlContext, raw_url: &str) -> PageOutcome {
    let url = match normalize_url(raw_url) {
        Ok(url) => url,
        Err(e) => {
            warn!(url = raw_url, error = %e, "skipping malformed URL");
            return PageOutcome::Malformed;
        }
    };

    info!(%url, captured = ctx.dedup.size(), "crawling");

    let deadline = ctx.config.fetch_timeout;
    let fetched = match tokio::time::timeout(deadline, ctx.fetcher.fetch(&url)).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout(deadline)),
    };

    let raw = match fetched {
        Ok(raw) => raw,
        Err(e) => {
            if e.is_http_error() {
                ctx.stats.http_errors.inc();
            }
            warn!(%url, error = %e, "fetch failed");
            return PageOutcome::FetchFailed;
        }
    };
    ctx.stats.html_pages.inc();

    let page = match ctx.parser.parse(&url, &raw) {
        Ok(page) => page,
        Err(e) => {
            warn!(%url, error = %e, "parse failed");
            return PageOutcome::ParseFailed;
        }
    };

    if !page.has_title() {
        ctx.stats.empty_pages.inc();
        warn!(%url, "skipping page without a title");
        return PageOutcome::Untitled;
    }
    if page.is_empty() {
        ctx.stats.empty_pages.inc();
        warn!(%url, "skipping empty page");
        return PageOutcome::Empty;
    }

    let stored = store_page(ctx, &page).await;
    if stored {
        ctx.dedup.add(&url);
    }

    let enqueued = enqueue_links(ctx, &page.links);

    PageOutcome::Processed { stored, enqueued }
}

async fn store_page(ctx: &CrawlContext, page: &Page) -> bool {
    ctx.stats.insert_attempts.inc();

    match ctx.sink.store(page).await {
        Ok(StoreOutcome::Inserted) => {
            ctx.stats.inserted.inc();
            info!(url = %page.url, "stored page");
            true
        }
        Ok(StoreOutcome::DuplicateKey) => {
            ctx.stats.failed_inserts.inc();
            warn!(url = %page.url, "duplicate URL skipped");
            false
        }
        Err(e) => {
            ctx.stats.failed_inserts.inc();
            error!(url = %page.url, error = %e, "failed to store page");
            false
        }
    }
}

// The cap check and the increment are separate steps, so concurrent
// workers can overshoot the threshold by a few URLs.
fn enqueue_links(ctx: &CrawlContext, links: &[String]) -> usize {
    let threshold = ctx.config.threshold as u64;
    let mut enqueued = 0;

    for link in links {
        let link = match normalize_url(link) {
            Ok(link) => link,
            Err(e) => {
                debug!(%link, error = %e, "skipping malformed link");
                continue;
            }
        };

        if ctx.dedup.contains(&link) {
            ctx.stats.skipped_duplicates.inc();
            debug!(%link, "already discovered");
            continue;
        }

        if ctx.stats.unique_enqueued.get() >= threshold {
            debug!(threshold, "enqueue cap reached");
            break;
        }

        ctx.frontier.enqueue(link);
        ctx.stats.total_seen.inc();
        ctx.stats.unique_enqueued.inc();
        enqueued += 1;
    }

    enqueued
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why is the enqueue cap soft?
//    - enqueue_links reads unique_enqueued, then enqueues, then increments
//    - Two workers can both read "threshold - 1" and both enqueue
//    - The overshoot is at most one URL per worker, and the dispatcher's
//      own threshold check still bounds how many pages get fetched
//
// 2. Why does a page enter the dedup filter only once it is stored?
//    - Seeds and stored pages are "captured"; a queued link is not yet
//    - A link found twice before its page is stored can be queued twice;
//      the sink's unique URL key turns the second store into DuplicateKey
//
// 3. Why are links followed even when the store fails?
//    - A storage error costs us that one page, not the pages it points to
// -----------------------------------------------------------------------------
