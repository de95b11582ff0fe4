//! Output module for crawl results and reports
//!
//! This module handles:
//! - Collecting extracted records into the final listing map
//! - Exporting that map as JSON
//! - Summarising a run from the pipeline tallies

mod aggregator;
mod json;
pub mod stats;

pub use aggregator::{aggregate, Aggregate};
pub use json::write_json;
pub use stats::{print_report, CrawlReport};
