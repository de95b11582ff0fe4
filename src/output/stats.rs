//! Run report assembled from the pipeline stages' tallies

use crate::crawler::{DedupeTally, PoolTally, SearchTally};
use crate::output::Aggregate;
use std::time::Duration;

/// Crawl run summary
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CrawlReport {
    /// Search pages fetched and scanned
    pub search_pages_visited: usize,

    /// Search pages that were the site's error page
    pub bad_search_pages: usize,

    /// Search pages that could not be fetched or decoded
    pub search_fetch_failures: usize,

    /// Listing links found, duplicates included
    pub listing_urls_discovered: usize,

    /// Distinct listing pages queued for extraction
    pub unique_listings: usize,

    /// Records successfully extracted
    pub records_extracted: usize,

    /// Listing pages that failed to fetch or extract
    pub listing_failures: usize,

    /// Records that replaced an earlier record with the same id
    pub duplicate_ids_overwritten: usize,

    /// Listings in the final output
    pub listings_written: usize,

    pub elapsed: Duration,
}

impl CrawlReport {
    /// Combines the tallies each stage returned when it finished
    pub fn from_tallies(
        search: SearchTally,
        dedupe: DedupeTally,
        pool: PoolTally,
        aggregate: &Aggregate,
        elapsed: Duration,
    ) -> Self {
        Self {
            search_pages_visited: search.pages_visited,
            bad_search_pages: search.bad_pages,
            search_fetch_failures: search.fetch_failures,
            listing_urls_discovered: search.listing_urls_found,
            unique_listings: dedupe.forwarded,
            records_extracted: pool.emitted,
            listing_failures: pool.processed.saturating_sub(pool.emitted),
            duplicate_ids_overwritten: aggregate.overwritten,
            listings_written: aggregate.listings.len(),
            elapsed,
        }
    }
}

/// Prints the report to stdout in a formatted manner
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");

    println!("Search pages:");
    println!("  Visited: {}", report.search_pages_visited);
    println!("  Site error pages: {}", report.bad_search_pages);
    println!("  Fetch failures: {}", report.search_fetch_failures);
    println!();

    println!("Listings:");
    println!("  Links discovered: {}", report.listing_urls_discovered);
    println!("  Unique pages: {}", report.unique_listings);
    println!("  Extracted: {}", report.records_extracted);
    println!("  Failed: {}", report.listing_failures);
    println!("  Duplicate ids overwritten: {}", report.duplicate_ids_overwritten);
    println!("  Written: {}", report.listings_written);
    println!();

    let success_rate = if report.unique_listings > 0 {
        (report.records_extracted as f64 / report.unique_listings as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "Success Rate: {:.1}% ({} / {} listing pages extracted) in {:.1}s",
        success_rate,
        report.records_extracted,
        report.unique_listings,
        report.elapsed.as_secs_f64()
    );
}
