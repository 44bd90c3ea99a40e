// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands:
// - crawl: the concurrent crawler (dispatcher + worker pool)
// - spider: the same pipeline in a single sequential loop
//
// Every flag can also come from an environment variable (SPIDER_*), so the
// crawler can be configured from a deployment without editing command lines.
// =============================================================================

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use web_spider::crawl::CrawlConfig;
use web_spider::logging::LogFormat;

const DEFAULT_SEEDS: [&str; 2] = ["https://news.ycombinator.com", "https://wikipedia.org"];

#[derive(Parser, Debug)]
#[command(
    name = "web-spider",
    version,
    about = "A breadth-first web crawler bounded by a page threshold",
    long_about = "web-spider crawls outward from a set of seed URLs, breadth first, \
                  and stores every accepted page as a line of JSON until the page \
                  threshold is reached or there is nothing left to crawl."
)]
pub struct Cli {
    /// Emit logs as JSON lines instead of compact text
    #[arg(long, global = true, env = "SPIDER_LOG_JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn log_format(&self) -> LogFormat {
        if self.log_json {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl with a pool of concurrent workers
    ///
    /// Example: web-spider crawl --workers 16 --threshold 500 https://example.com
    Crawl {
        #[command(flatten)]
        common: CommonArgs,

        /// Number of concurrent workers
        #[arg(long, env = "SPIDER_WORKERS", default_value_t = 16)]
        workers: usize,

        /// Capacity of the job channel between dispatcher and workers
        #[arg(long, env = "SPIDER_CHANNEL_CAPACITY", default_value_t = 100)]
        channel_capacity: usize,

        /// Seconds between progress samples
        #[arg(long, env = "SPIDER_SAMPLE_INTERVAL_SECS", default_value_t = 1)]
        sample_interval_secs: u64,
    },

    /// Crawl one page at a time, without concurrency
    ///
    /// Example: web-spider spider --threshold 50 https://example.com
    Spider {
        #[command(flatten)]
        common: CommonArgs,

        /// Seconds between progress samples
        #[arg(long, env = "SPIDER_SAMPLE_INTERVAL_SECS", default_value_t = 10)]
        sample_interval_secs: u64,
    },
}

/// Flags shared by both crawl modes.
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Seed URLs to start from
    #[arg(default_values = DEFAULT_SEEDS)]
    pub seeds: Vec<String>,

    /// Maximum number of pages to crawl
    #[arg(long, env = "SPIDER_THRESHOLD", default_value_t = 100)]
    pub threshold: usize,

    /// Seconds before a single fetch is abandoned
    #[arg(long, env = "SPIDER_FETCH_TIMEOUT_SECS", default_value_t = 10)]
    pub fetch_timeout_secs: u64,

    /// JSON Lines file the accepted pages are appended to
    #[arg(long, env = "SPIDER_OUTPUT", default_value = "pages.jsonl")]
    pub output: PathBuf,

    /// Keep pages in memory instead of writing them out
    #[arg(long)]
    pub dry_run: bool,

    /// Print the final report as JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}

impl Commands {
    pub fn common(&self) -> &CommonArgs {
        match self {
            Commands::Crawl { common, .. } | Commands::Spider { common, .. } => common,
        }
    }

    pub fn is_sequential(&self) -> bool {
        matches!(self, Commands::Spider { .. })
    }

    /// Converts the parsed flags into the engine's configuration.
    pub fn crawl_config(&self) -> CrawlConfig {
        match self {
            Commands::Crawl {
                common,
                workers,
                channel_capacity,
                sample_interval_secs,
            } => CrawlConfig {
                workers: *workers,
                threshold: common.threshold,
                channel_capacity: *channel_capacity,
                sample_interval: Duration::from_secs(*sample_interval_secs),
                fetch_timeout: Duration::from_secs(common.fetch_timeout_secs),
                ..CrawlConfig::default()
            },
            Commands::Spider {
                common,
                sample_interval_secs,
            } => CrawlConfig {
                threshold: common.threshold,
                sample_interval: Duration::from_secs(*sample_interval_secs),
                fetch_timeout: Duration::from_secs(common.fetch_timeout_secs),
                ..CrawlConfig::sequential()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_crawl_flags_map_to_config() {
        let cli = Cli::try_parse_from([
            "web-spider",
            "crawl",
            "--workers",
            "4",
            "--threshold",
            "25",
            "https://example.com",
        ])
        .unwrap();

        let config = cli.command.crawl_config();
        assert_eq!(config.workers, 4);
        assert_eq!(config.threshold, 25);
        assert_eq!(config.sample_interval, Duration::from_secs(1));
        assert_eq!(cli.command.common().seeds, vec!["https://example.com"]);
        assert!(!cli.command.is_sequential());
    }

    #[test]
    fn test_spider_defaults() {
        let cli = Cli::try_parse_from(["web-spider", "spider"]).unwrap();

        let config = cli.command.crawl_config();
        assert_eq!(config.workers, 1);
        assert_eq!(config.sample_interval, Duration::from_secs(10));
        assert_eq!(cli.command.common().seeds.len(), DEFAULT_SEEDS.len());
        assert!(cli.command.is_sequential());
    }
}
