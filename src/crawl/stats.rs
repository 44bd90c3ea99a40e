// src/crawl/stats.rs
// =============================================================================
// Crawl statistics.
//
// Every worker bumps these counters, so each one is its own atomic: no
// shared lock on the hot path, and a counter can only ever go up. The two
// time series are appended to by the sampler only and share one small lock.
//
// The Sampler is a background task that records, on a fixed interval:
// - elapsed minutes -> dedup filter size
// - elapsed minutes -> dedup filter size / frontier size
// It runs until the termination coordinator stops it.
// =============================================================================

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Monotonic counter safe to bump from any task.
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// One point of a time series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub elapsed_minutes: f64,
    pub value: f64,
}

#[derive(Debug, Default)]
struct Series {
    pages_per_minute: Vec<Sample>,
    crawled_ratio_per_minute: Vec<Sample>,
}

#[derive(Debug, Clone, Copy)]
struct Finished {
    at: DateTime<Utc>,
    elapsed: Duration,
}

/// Counters and time series for one crawl run.
///
/// Created once when the crawl starts and finished once when every worker
/// has stopped.
#[derive(Debug)]
pub struct CrawlerStats {
    pub total_seen: Counter,
    pub unique_enqueued: Counter,
    pub insert_attempts: Counter,
    pub inserted: Counter,
    pub failed_inserts: Counter,
    pub html_pages: Counter,
    pub empty_pages: Counter,
    pub skipped_duplicates: Counter,
    pub http_errors: Counter,
    started_at: DateTime<Utc>,
    started: Instant,
    finished: Mutex<Option<Finished>>,
    series: Mutex<Series>,
}

impl Default for CrawlerStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CrawlerStats {
    /// Starts the crawl clock.
    pub fn new() -> Self {
        Self {
            total_seen: Counter::default(),
            unique_enqueued: Counter::default(),
            insert_attempts: Counter::default(),
            inserted: Counter::default(),
            failed_inserts: Counter::default(),
            html_pages: Counter::default(),
            empty_pages: Counter::default(),
            skipped_duplicates: Counter::default(),
            http_errors: Counter::default(),
            started_at: Utc::now(),
            started: Instant::now(),
            finished: Mutex::new(None),
            series: Mutex::new(Series::default()),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Stops the crawl clock. Only the first call has an effect.
    pub fn finish(&self) {
        let mut finished = self.finished.lock();
        if finished.is_none() {
            *finished = Some(Finished {
                at: Utc::now(),
                elapsed: self.started.elapsed(),
            });
        }
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.finished.lock().map(|f| f.at)
    }

    /// Time since start, frozen once the crawl is finished.
    pub fn elapsed(&self) -> Duration {
        match *self.finished.lock() {
            Some(finished) => finished.elapsed,
            None => self.started.elapsed(),
        }
    }

    /// Appends one sample to each time series, stamped with the time since start.
    pub fn record_sample(&self, dedup_size: usize, frontier_size: usize) {
        self.record_sample_at(self.started.elapsed(), dedup_size, frontier_size);
    }

    pub fn record_sample_at(&self, elapsed: Duration, dedup_size: usize, frontier_size: usize) {
        let elapsed_minutes = elapsed.as_secs_f64() / 60.0;
        let mut series = self.series.lock();
        series.pages_per_minute.push(Sample {
            elapsed_minutes,
            value: dedup_size as f64,
        });
        series.crawled_ratio_per_minute.push(Sample {
            elapsed_minutes,
            value: safe_divide(dedup_size as u64, frontier_size as u64),
        });
    }

    pub fn url_uniqueness_ratio(&self) -> f64 {
        safe_divide(self.unique_enqueued.get(), self.total_seen.get())
    }

    pub fn insert_success_rate(&self) -> f64 {
        safe_divide(self.inserted.get(), self.unique_enqueued.get())
    }

    pub fn insert_failure_rate(&self) -> f64 {
        safe_divide(self.failed_inserts.get(), self.insert_attempts.get())
    }

    pub fn html_pages_ratio(&self) -> f64 {
        safe_divide(self.html_pages.get(), self.total_seen.get())
    }

    pub fn empty_pages_rate(&self) -> f64 {
        safe_divide(self.empty_pages.get(), self.html_pages.get())
    }

    pub fn http_error_rate(&self) -> f64 {
        safe_divide(self.http_errors.get(), self.total_seen.get())
    }

    pub fn duplicates_skip_rate(&self) -> f64 {
        safe_divide(self.skipped_duplicates.get(), self.total_seen.get())
    }

    pub fn storage_yield(&self) -> f64 {
        safe_divide(self.inserted.get(), self.total_seen.get())
    }

    /// Serializable snapshot of everything above.
    pub fn report(&self, total_processed: usize) -> StatsReport {
        let series = self.series.lock();

        StatsReport {
            started_at: self.started_at,
            ended_at: self.ended_at(),
            duration_secs: self.elapsed().as_secs_f64(),
            total_processed,
            counters: CounterSnapshot {
                total_seen: self.total_seen.get(),
                unique_enqueued: self.unique_enqueued.get(),
                insert_attempts: self.insert_attempts.get(),
                inserted: self.inserted.get(),
                failed_inserts: self.failed_inserts.get(),
                html_pages: self.html_pages.get(),
                empty_pages: self.empty_pages.get(),
                skipped_duplicates: self.skipped_duplicates.get(),
                http_errors: self.http_errors.get(),
            },
            ratios: Ratios {
                url_uniqueness: self.url_uniqueness_ratio(),
                insert_success: self.insert_success_rate(),
                insert_failure: self.insert_failure_rate(),
                html_pages: self.html_pages_ratio(),
                empty_pages: self.empty_pages_rate(),
                http_errors: self.http_error_rate(),
                duplicates_skipped: self.duplicates_skip_rate(),
                storage_yield: self.storage_yield(),
            },
            pages_per_minute: series.pages_per_minute.clone(),
            crawled_ratio_per_minute: series.crawled_ratio_per_minute.clone(),
        }
    }
}

/// 0.0 instead of NaN/inf when there is nothing to divide by.
pub fn safe_divide(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    pub total_seen: u64,
    pub unique_enqueued: u64,
    pub insert_attempts: u64,
    pub inserted: u64,
    pub failed_inserts: u64,
    pub html_pages: u64,
    pub empty_pages: u64,
    pub skipped_duplicates: u64,
    pub http_errors: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ratios {
    pub url_uniqueness: f64,
    pub insert_success: f64,
    pub insert_failure: f64,
    pub html_pages: f64,
    pub empty_pages: f64,
    pub http_errors: f64,
    pub duplicates_skipped: f64,
    pub storage_yield: f64,
}

/// Final (or in-progress) view of a crawl run.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_secs: f64,
    pub total_processed: usize,
    pub counters: CounterSnapshot,
    pub ratios: Ratios,
    pub pages_per_minute: Vec<Sample>,
    pub crawled_ratio_per_minute: Vec<Sample>,
}

/// Handle to the periodic sampling task.
#[derive(Debug)]
pub struct Sampler {
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl Sampler {
    /// Spawns a task that calls `measure` every `period` and records the
    /// returned (dedup size, frontier size) into `stats`.
    ///
    /// The first sample is taken one full period after start.
    pub fn spawn<F>(stats: Arc<CrawlerStats>, period: Duration, measure: F) -> Self
    where
        F: Fn() -> (usize, usize) + Send + 'static,
    {
        let (stop_tx, mut stop_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        let (dedup_size, frontier_size) = measure();
                        stats.record_sample(dedup_size, frontier_size);
                        debug!(dedup_size, frontier_size, "recorded crawl sample");
                    }
                }
            }
        });

        Self {
            stop: Some(stop_tx),
            handle,
        }
    }

    /// Stops sampling and waits for the task to exit.
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Err(e) = self.handle.await {
            warn!(error = %e, "stats sampler ended abnormally");
        }
    }
}
