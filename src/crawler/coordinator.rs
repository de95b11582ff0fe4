//! Crawler coordinator - wires the pipeline stages together
//!
//! ```text
//! seeds ─► SearchFrontier ─► listing dedupe ─► worker pool ─► aggregate
//!             ▲      │          (SeenSet)     fetch+extract
//!             └──────┘
//!            next pages
//! ```
//!
//! Every arrow after the frontier is a bounded channel. Each stage returns
//! a tally when its input closes, and the report is built from those.

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, fetch_url, FetchResult};
use crate::crawler::frontier::{spawn_dedupe, SearchFrontier, SeenSet};
use crate::crawler::pool::parallel_map;
use crate::listing::{extract_listing, PropertyRecord};
use crate::output::{aggregate, write_json, CrawlReport};
use crate::url::{parse_page_url, UrlRole};
use crate::Result;
use reqwest::Client;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use url::Url;

/// Everything one crawl produced
#[derive(Debug)]
pub struct CrawlOutcome {
    pub listings: BTreeMap<String, PropertyRecord>,
    pub report: CrawlReport,
}

/// Crawls from the configured seeds and returns the listings in memory
pub async fn collect_listings(config: &Config) -> Result<CrawlOutcome> {
    let started = Instant::now();
    let crawler = &config.crawler;
    let capacity = crawler.channel_capacity;

    let client = build_http_client(
        &config.user_agent,
        Duration::from_secs(crawler.request_timeout_secs),
    )?;

    let mut frontier = SearchFrontier::new(
        client.clone(),
        crawler.max_concurrent_search_pages as usize,
    );
    for seed in &config.search.seeds {
        frontier.enqueue(&parse_page_url(seed)?);
    }
    tracing::info!(
        "Starting crawl: {} seeds, {} workers",
        frontier.pages_seen(),
        crawler.workers
    );

    let (found_tx, found_rx) = mpsc::channel(capacity);
    let search = tokio::spawn(frontier.run(found_tx));

    let (unique_rx, dedupe) = spawn_dedupe(found_rx, SeenSet::new(UrlRole::Listing), capacity);

    let workers = crawler.workers as usize;
    let (records_rx, pool) = parallel_map(workers, unique_rx, capacity, move |url: Url| {
        let client = client.clone();
        async move { fetch_listing(&client, url).await }
    });

    let collected = aggregate(records_rx).await;

    let search = search.await?;
    let dedupe = dedupe.await?;
    let pool = pool.await?;

    let report = CrawlReport::from_tallies(search, dedupe, pool, &collected, started.elapsed());
    Ok(CrawlOutcome {
        listings: collected.listings,
        report,
    })
}

/// Runs a complete crawl and writes the JSON output
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client
/// 2. Walk the search pages from the seeds
/// 3. Fetch and extract each distinct listing
/// 4. Write the listing map to `output.json-path`
pub async fn run_crawl(config: Config) -> Result<CrawlReport> {
    let outcome = collect_listings(&config).await?;
    write_json(&outcome.listings, Path::new(&config.output.json_path))?;

    tracing::info!(
        "Crawl complete: {} listings in {:.1}s",
        outcome.report.listings_written,
        outcome.report.elapsed.as_secs_f64()
    );
    Ok(outcome.report)
}

/// Fetches one listing page and extracts its record
///
/// Failures are logged and yield `None`; they never stop other workers.
async fn fetch_listing(client: &Client, url: Url) -> Option<PropertyRecord> {
    let body = match fetch_url(client, url.as_str()).await {
        FetchResult::Success { body, .. } => body,
        failure => {
            tracing::warn!(
                "Failed to fetch listing {}: {}",
                url,
                failure.failure_reason().unwrap_or_default()
            );
            return None;
        }
    };

    match extract_listing(&url, &body) {
        Ok(record) => {
            tracing::debug!("Extracted listing {} from {}", record.listing_id, url);
            Some(record)
        }
        Err(e) => {
            tracing::warn!("Skipping listing {}: {}", url, e);
            None
        }
    }
}
