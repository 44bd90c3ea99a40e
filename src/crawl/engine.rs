// src/crawl/engine.rs
// =============================================================================
// The crawl engine: wires frontier, dedup filter, stats, dispatcher, workers
// and the termination coordinator into one run.
//
// A run goes through these steps:
// 1. Validate the config and ping the storage sink (fatal if unreachable)
// 2. Normalize the seeds into the frontier and the dedup filter
// 3. Start the stats sampler
// 4. Start N workers and the dispatcher
// 5. Wait for every worker to finish, then stop the sampler and report
//
// `run_sequential` is the same pipeline without any concurrency: one loop
// dequeues and processes URLs until the threshold or an empty frontier.
// =============================================================================

use futures::future::join_all;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::context::{CrawlConfig, CrawlContext};
use super::coordinator::{finalize, TerminationCoordinator};
use super::dispatcher::Dispatcher;
use super::stats::StatsReport;
use super::worker::{process_url, Worker};
use crate::error::CrawlError;
use crate::page::{normalize_url, Fetcher, PageParser};
use crate::store::PageSink;

/// A configured crawler. Every `run` starts from empty state.
pub struct Crawler {
    config: CrawlConfig,
    fetcher: Arc<dyn Fetcher>,
    parser: Arc<dyn PageParser>,
    sink: Arc<dyn PageSink>,
}

impl Crawler {
    pub fn new(
        config: CrawlConfig,
        fetcher: Arc<dyn Fetcher>,
        parser: Arc<dyn PageParser>,
        sink: Arc<dyn PageSink>,
    ) -> Result<Self, CrawlError> {
        config.validate()?;
        Ok(Self {
            config,
            fetcher,
            parser,
            sink,
        })
    }

    /// Concurrent crawl with `config.workers` workers.
    pub async fn run(&self, seeds: &[String]) -> Result<StatsReport, CrawlError> {
        let ctx = self.prepare(seeds).await?;
        let workers = ctx.config.workers;
        info!(workers, threshold = ctx.config.threshold, "starting concurrent crawl");

        let sampler = ctx.spawn_sampler();
        let (jobs_tx, jobs_rx) = flume::bounded(ctx.config.channel_capacity);
        let (coordinator, done_tx) = TerminationCoordinator::new(workers);

        let worker_handles: Vec<_> = (0..workers)
            .map(|id| {
                let worker = Worker::new(id, Arc::clone(&ctx), jobs_rx.clone(), done_tx.clone());
                tokio::spawn(worker.run())
            })
            .collect();
        // Only the workers may hold these, or the channels never close.
        drop(jobs_rx);
        drop(done_tx);

        let dispatcher = tokio::spawn(Dispatcher::new(Arc::clone(&ctx), jobs_tx).run());

        let report = coordinator.finish(&ctx, sampler).await;

        match dispatcher.await {
            Ok(outcome) => info!(?outcome, "dispatcher stopped"),
            Err(e) => error!(error = %e, "dispatcher task failed"),
        }
        for (id, result) in join_all(worker_handles).await.into_iter().enumerate() {
            if let Err(e) = result {
                error!(worker = id, error = %e, "worker task failed");
            }
        }

        Ok(report)
    }

    /// Single-task crawl: no dispatcher, no channel, no worker pool.
    pub async fn run_sequential(&self, seeds: &[String]) -> Result<StatsReport, CrawlError> {
        let ctx = self.prepare(seeds).await?;
        let threshold = ctx.config.threshold;
        info!(threshold, "starting sequential crawl");

        let sampler = ctx.spawn_sampler();

        while ctx.frontier.size() > 0 && ctx.frontier.total_processed_urls() < threshold {
            let Ok(url) = ctx.frontier.dequeue() else {
                break;
            };
            process_url(&ctx, &url).await;
        }

        Ok(finalize(&ctx, sampler).await)
    }

    // Fresh state for one run, with the sink checked and the seeds queued.
    async fn prepare(&self, seeds: &[String]) -> Result<Arc<CrawlContext>, CrawlError> {
        if seeds.is_empty() {
            return Err(CrawlError::InvalidConfig("at least one seed URL is required".to_string()));
        }

        self.sink.ping().await.map_err(CrawlError::SinkUnavailable)?;

        let ctx = Arc::new(CrawlContext::new(
            self.config.clone(),
            Arc::clone(&self.fetcher),
            Arc::clone(&self.parser),
            Arc::clone(&self.sink),
        ));

        for seed in seeds {
            let url = normalize_url(seed).map_err(CrawlError::InvalidSeed)?;
            if !ctx.dedup.add(&url) {
                warn!(%url, "duplicate seed ignored");
                continue;
            }
            ctx.frontier.enqueue(url);
            ctx.stats.total_seen.inc();
            ctx.stats.unique_enqueued.inc();
        }

        info!(seeds = ctx.frontier.size(), "frontier seeded");
        Ok(ctx)
    }
}
