// src/crawl/context.rs
// =============================================================================
// Configuration and shared state for one crawl run.
//
// The frontier, the dedup filter and the stats each guard only their own
// state, so no code path ever holds two of their locks at once.
// =============================================================================

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::dedup::DedupFilter;
use super::frontier::Frontier;
use super::stats::{CrawlerStats, Sampler};
use crate::error::CrawlError;
use crate::page::{Fetcher, PageParser};
use crate::store::PageSink;

/// Knobs for a crawl run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlConfig {
    /// Number of concurrent workers.
    pub workers: usize,
    /// Cap on processed (and, softly, enqueued) URLs.
    pub threshold: usize,
    /// Capacity of the job channel between dispatcher and workers.
    pub channel_capacity: usize,
    /// How often the stats sampler records a point.
    pub sample_interval: Duration,
    /// Deadline for a single fetch.
    pub fetch_timeout: Duration,
    /// Longest the dispatcher sleeps on an empty frontier before re-checking.
    pub idle_poll: Duration,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            workers: 16,
            threshold: 100,
            channel_capacity: 100,
            sample_interval: Duration::from_secs(1),
            fetch_timeout: Duration::from_secs(10),
            idle_poll: Duration::from_millis(100),
        }
    }
}

impl CrawlConfig {
    /// Defaults for the single-task spider: one worker, 10s samples.
    pub fn sequential() -> Self {
        Self {
            workers: 1,
            sample_interval: Duration::from_secs(10),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), CrawlError> {
        let invalid = |what: &str| {
            Err(CrawlError::InvalidConfig(format!(
                "{} must be greater than zero",
                what
            )))
        };

        if self.workers == 0 {
            return invalid("worker count");
        }
        if self.threshold == 0 {
            return invalid("threshold");
        }
        if self.channel_capacity == 0 {
            return invalid("channel capacity");
        }
        if self.sample_interval.is_zero() {
            return invalid("sample interval");
        }
        if self.fetch_timeout.is_zero() {
            return invalid("fetch timeout");
        }
        if self.idle_poll.is_zero() {
            return invalid("idle poll interval");
        }
        Ok(())
    }
}

/// Jobs handed out by the dispatcher and not yet finished by a worker.
#[derive(Debug, Default)]
pub struct InFlight {
    count: AtomicUsize,
}

impl InFlight {
    pub fn start(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    pub fn finish(&self) {
        self.count.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn is_idle(&self) -> bool {
        self.count.load(Ordering::SeqCst) == 0
    }
}

/// Everything the dispatcher and the workers share during one run.
pub struct CrawlContext {
    pub config: CrawlConfig,
    pub frontier: Frontier,
    pub dedup: DedupFilter,
    pub stats: Arc<CrawlerStats>,
    pub in_flight: InFlight,
    pub fetcher: Arc<dyn Fetcher>,
    pub parser: Arc<dyn PageParser>,
    pub sink: Arc<dyn PageSink>,
}

impl CrawlContext {
    /// Fresh state: empty frontier and filter, stats clock started now.
    pub fn new(
        config: CrawlConfig,
        fetcher: Arc<dyn Fetcher>,
        parser: Arc<dyn PageParser>,
        sink: Arc<dyn PageSink>,
    ) -> Self {
        let capacity = config.threshold.min(100_000);

        Self {
            frontier: Frontier::with_capacity(capacity),
            dedup: DedupFilter::with_capacity(capacity),
            stats: Arc::new(CrawlerStats::new()),
            in_flight: InFlight::default(),
            config,
            fetcher,
            parser,
            sink,
        }
    }

    /// Starts sampling dedup size and frontier size into the stats.
    pub fn spawn_sampler(self: &Arc<Self>) -> Sampler {
        let ctx = Arc::clone(self);
        Sampler::spawn(Arc::clone(&self.stats), self.config.sample_interval, move || {
            (ctx.dedup.size(), ctx.frontier.size())
        })
    }
}

/// Marks one dispatched job as finished when dropped, whatever path the
/// worker took out of it, and wakes the dispatcher to re-check for work.
pub struct JobGuard<'a> {
    ctx: &'a CrawlContext,
}

impl<'a> JobGuard<'a> {
    pub fn new(ctx: &'a CrawlContext) -> Self {
        Self { ctx }
    }
}

impl Drop for JobGuard<'_> {
    fn drop(&mut self) {
        self.ctx.in_flight.finish();
        self.ctx.frontier.wake();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(CrawlConfig::default().validate().is_ok());
        assert!(CrawlConfig::sequential().validate().is_ok());
    }

    #[test]
    fn test_zero_values_are_rejected() {
        let configs = [
            CrawlConfig { workers: 0, ..CrawlConfig::default() },
            CrawlConfig { threshold: 0, ..CrawlConfig::default() },
            CrawlConfig { channel_capacity: 0, ..CrawlConfig::default() },
            CrawlConfig { sample_interval: Duration::ZERO, ..CrawlConfig::default() },
            CrawlConfig { fetch_timeout: Duration::ZERO, ..CrawlConfig::default() },
            CrawlConfig { idle_poll: Duration::ZERO, ..CrawlConfig::default() },
        ];

        for config in configs {
            assert!(matches!(config.validate(), Err(CrawlError::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_in_flight_tracking() {
        let in_flight = InFlight::default();
        assert!(in_flight.is_idle());
        in_flight.start();
        in_flight.start();
        in_flight.finish();
        assert!(!in_flight.is_idle());
        in_flight.finish();
        assert!(in_flight.is_idle());
    }
}
