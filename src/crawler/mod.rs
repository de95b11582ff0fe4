//! Crawler module for page fetching and the crawl pipeline
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and outcome classification
//! - Search-page scanning for listing and pagination links
//! - Seen-set deduplication of search and listing pages
//! - The worker pool that fetches and extracts listings
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod pool;
mod walker;

pub use coordinator::{collect_listings, run_crawl, CrawlOutcome};
pub use fetcher::{build_http_client, fetch_url, user_agent_string, FetchResult};
pub use frontier::{
    dedupe_and_forward, spawn_dedupe, DedupeTally, SearchFrontier, SearchTally, SeenSet,
};
pub use pool::{parallel_map, PoolTally};
pub use walker::{scan_search_page, SearchPageLinks, WalkError};
