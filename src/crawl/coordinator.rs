// src/crawl/coordinator.rs
// =============================================================================
// Termination: wait until every worker has said it is done, and only then
// stop the sampler and freeze the stats. No worker can still be touching
// shared state when the final numbers are taken.
// =============================================================================

use tokio::sync::mpsc;
use tracing::{info, warn};

use super::context::CrawlContext;
use super::stats::{Sampler, StatsReport};

pub struct TerminationCoordinator {
    workers: usize,
    done: mpsc::Receiver<usize>,
}

impl TerminationCoordinator {
    /// Returns the coordinator and the sender each worker signals on.
    pub fn new(workers: usize) -> (Self, mpsc::Sender<usize>) {
        let (tx, rx) = mpsc::channel(workers.max(1));
        (Self { workers, done: rx }, tx)
    }

    /// Blocks until `workers` completion signals arrived.
    ///
    /// Returns how many arrived; fewer than expected only if some worker
    /// died without signalling (every sender is then gone).
    pub async fn wait_for_workers(&mut self) -> usize {
        let mut finished = 0;

        while finished < self.workers {
            match self.done.recv().await {
                Some(worker) => {
                    finished += 1;
                    info!(worker, finished, total = self.workers, "worker signalled completion");
                }
                None => {
                    warn!(
                        finished,
                        expected = self.workers,
                        "completion channel closed early"
                    );
                    break;
                }
            }
        }

        finished
    }

    /// Waits for the workers, then finalizes the run.
    pub async fn finish(mut self, ctx: &CrawlContext, sampler: Sampler) -> StatsReport {
        self.wait_for_workers().await;
        finalize(ctx, sampler).await
    }
}

/// Stops sampling, stops the clock and takes the final report.
pub async fn finalize(ctx: &CrawlContext, sampler: Sampler) -> StatsReport {
    sampler.stop().await;
    ctx.stats.finish();

    let report = ctx.stats.report(ctx.frontier.total_processed_urls());
    let counters = &report.counters;
    info!(
        total_processed = report.total_processed,
        total_seen = counters.total_seen,
        unique_enqueued = counters.unique_enqueued,
        inserted = counters.inserted,
        insert_attempts = counters.insert_attempts,
        failed_inserts = counters.failed_inserts,
        html_pages = counters.html_pages,
        empty_pages = counters.empty_pages,
        skipped_duplicates = counters.skipped_duplicates,
        http_errors = counters.http_errors,
        "crawl finished"
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_waits_for_every_worker() {
        let (mut coordinator, done) = TerminationCoordinator::new(3);

        for id in 0..3 {
            let done = done.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10 * id as u64)).await;
                done.send(id).await.unwrap();
            });
        }
        drop(done);

        assert_eq!(coordinator.wait_for_workers().await, 3);
    }

    #[tokio::test]
    async fn test_does_not_return_before_last_signal() {
        let (mut coordinator, done) = TerminationCoordinator::new(2);
        done.send(0).await.unwrap();

        let early =
            tokio::time::timeout(Duration::from_millis(50), coordinator.wait_for_workers()).await;
        assert!(early.is_err(), "one of two workers is still running");
    }

    #[tokio::test]
    async fn test_closed_channel_ends_the_wait() {
        let (mut coordinator, done) = TerminationCoordinator::new(4);
        done.send(0).await.unwrap();
        drop(done);

        assert_eq!(coordinator.wait_for_workers().await, 1);
    }
}
