// src/main.rs
// =============================================================================
// This is the entry point of the web-spider CLI.
//
// What happens here:
// 1. Parse command-line arguments (and SPIDER_* environment variables)
// 2. Set up logging
// 3. Open the page store; a store we cannot write to stops us right here
// 4. Run the crawl in the requested mode
// 5. Print the final stats and exit (0 = success, 2 = error)
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;

use cli::{Cli, Commands};
use web_spider::crawl::{Crawler, Sample, StatsReport};
use web_spider::page::{HtmlParser, HttpFetcher};
use web_spider::store::{JsonlSink, MemorySink, PageSink};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = web_spider::logging::init_logging(cli.log_format()) {
        eprintln!("Warning: could not initialize logging: {}", e);
    }

    let command = cli.command;
    let common = command.common();
    let config = command.crawl_config();

    let sink: Arc<dyn PageSink> = if common.dry_run {
        Arc::new(MemorySink::new())
    } else {
        let sink = JsonlSink::open(&common.output)
            .await
            .with_context(|| format!("cannot open page store {}", common.output.display()))?;
        Arc::new(sink)
    };

    let fetcher = HttpFetcher::new(config.fetch_timeout).context("failed to build HTTP client")?;
    let crawler = Crawler::new(config, Arc::new(fetcher), Arc::new(HtmlParser::new()), sink)?;

    let report = if command.is_sequential() {
        crawler.run_sequential(&common.seeds).await?
    } else {
        crawler.run(&common.seeds).await?
    };

    print_report(&report, common.json)
}

fn print_report(report: &StatsReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print_summary(report);
    }
    Ok(())
}

fn print_summary(report: &StatsReport) {
    let c = &report.counters;
    println!("Total processed: {}", report.total_processed);
    println!(
        "Raw stats: seen {}, unique enqueued {}, inserted {}, insert attempts {}, \
         failed inserts {}, HTML pages {}, empty pages {}, skipped duplicates {}, \
         HTTP errors {}",
        c.total_seen,
        c.unique_enqueued,
        c.inserted,
        c.insert_attempts,
        c.failed_inserts,
        c.html_pages,
        c.empty_pages,
        c.skipped_duplicates,
        c.http_errors,
    );

    println!();
    println!("Pages crawled per minute:");
    print_series(&report.pages_per_minute);
    println!("Crawl to queued ratio per minute:");
    print_series(&report.crawled_ratio_per_minute);

    let r = &report.ratios;
    println!();
    println!("URL uniqueness ratio:   {:.2}", r.url_uniqueness);
    println!("Insert success rate:    {:.2}", r.insert_success);
    println!("Insert failure rate:    {:.2}", r.insert_failure);
    println!("HTML page ratio:        {:.2}", r.html_pages);
    println!("Empty page rate:        {:.2}", r.empty_pages);
    println!("Duplicate skip rate:    {:.2}", r.duplicates_skipped);
    println!("HTTP error rate:        {:.2}", r.http_errors);
    println!("Storage yield:          {:.2}", r.storage_yield);

    println!();
    println!("Finished in {:.1}s", report.duration_secs);
}

fn print_series(samples: &[Sample]) {
    for sample in samples {
        println!("{:.6} {:.6}", sample.elapsed_minutes, sample.value);
    }
    println!();
}
