// src/crawl/dispatcher.rs
// =============================================================================
// The dispatcher: the single task that feeds the workers.
//
// How it works:
// 1. If the frontier has handed out `threshold` URLs, stop
// 2. Otherwise take the next URL from the frontier and push it into the
//    bounded job channel (this waits while the channel is full, which
//    keeps the frontier from racing ahead of slow workers)
// 3. If the frontier is empty, either every job is finished and nothing
//    can refill it (stop), or wait for a worker to enqueue or finish
//
// Stopping means dropping the sender: the workers drain what is buffered
// and then see the channel as closed.
// =============================================================================

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::context::CrawlContext;

/// Why the dispatcher closed the job channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    ThresholdReached,
    /// Nothing queued and nothing in flight that could queue more.
    FrontierExhausted,
    /// Every worker dropped its receiver.
    WorkersGone,
}

pub struct Dispatcher {
    ctx: Arc<CrawlContext>,
    jobs: flume::Sender<String>,
}

impl Dispatcher {
    pub fn new(ctx: Arc<CrawlContext>, jobs: flume::Sender<String>) -> Self {
        Self { ctx, jobs }
    }

    /// Runs until one of the stop conditions holds, then closes the channel.
    pub async fn run(self) -> DispatchOutcome {
        let ctx = &self.ctx;
        let threshold = ctx.config.threshold;

        let outcome = loop {
            if ctx.frontier.total_processed_urls() >= threshold {
                warn!(threshold, "threshold reached");
                break DispatchOutcome::ThresholdReached;
            }

            match ctx.frontier.try_dequeue() {
                Some(url) => {
                    ctx.in_flight.start();
                    debug!(%url, "dispatching job");
                    if self.jobs.send_async(url).await.is_err() {
                        ctx.in_flight.finish();
                        warn!("all workers are gone");
                        break DispatchOutcome::WorkersGone;
                    }
                }
                None => {
                    // In-flight first: a worker enqueues its links before it
                    // finishes its job, so idle + empty means nothing can
                    // refill the frontier any more.
                    if ctx.in_flight.is_idle() && ctx.frontier.is_empty() {
                        info!("frontier exhausted");
                        break DispatchOutcome::FrontierExhausted;
                    }
                    ctx.frontier.wait_for_work(ctx.config.idle_poll).await;
                }
            }
        };

        info!(
            ?outcome,
            processed = ctx.frontier.total_processed_urls(),
            "closing job channel"
        );
        outcome
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why check in_flight before the frontier when it looks empty?
//    - A worker enqueues its links and only then drops its JobGuard
//    - Reading in_flight first means a worker that was busy when we looked
//      has already pushed its links by the time we read the frontier
//    - The other order can see an empty frontier, then an idle pool that
//      just filled it, and stop with work left
//
// 2. Why does the threshold count dispatched URLs, not stored pages?
//    - total_processed goes up on every dequeue, failures included
//    - A crawl of broken links still ends after `threshold` attempts
//
// 3. Why wait_for_work with a timeout instead of a plain sleep?
//    - enqueue and JobGuard::drop both wake us straight away
//    - The timeout is only a fallback so the stop checks run regularly
// -----------------------------------------------------------------------------
