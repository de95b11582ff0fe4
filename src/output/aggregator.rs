//! Collects the record stream into the final listing map

use crate::listing::PropertyRecord;
use std::collections::BTreeMap;
use tokio::sync::mpsc::Receiver;

/// How often a progress line is logged, in records
const PROGRESS_INTERVAL: usize = 10;

/// Every extracted listing, keyed by listing id
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Aggregate {
    pub listings: BTreeMap<String, PropertyRecord>,
    /// Records received
    pub received: usize,
    /// Records that replaced an earlier one with the same id
    pub overwritten: usize,
}

/// Drains `records` into a map, the last record for an id winning
///
/// Returns once every sender is gone.
pub async fn aggregate(mut records: Receiver<PropertyRecord>) -> Aggregate {
    let mut result = Aggregate::default();

    while let Some(record) = records.recv().await {
        result.insert(record);

        if result.received % PROGRESS_INTERVAL == 0 {
            tracing::info!(
                "Progress: {} listings extracted, {} unique",
                result.received,
                result.listings.len()
            );
        }
    }

    result
}

impl Aggregate {
    fn insert(&mut self, record: PropertyRecord) {
        self.received += 1;
        let source_url = record.source_url.clone();

        if let Some(previous) = self.listings.insert(record.listing_id.clone(), record) {
            self.overwritten += 1;
            tracing::debug!(
                "Listing {} from {} replaces the one from {}",
                previous.listing_id,
                source_url,
                previous.source_url
            );
        }
    }
}
