use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One fully extracted listing
///
/// Records are only ever built whole: the extractor returns an error rather
/// than a record with missing sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    /// Identifier taken from the listing's inline script
    pub listing_id: String,

    /// Absolute URL the listing was fetched from
    pub source_url: String,

    pub title: String,

    /// Asking price in dollars
    pub price: f64,

    /// May be empty
    pub description: String,

    /// Attribute table, label to value
    pub attributes: BTreeMap<String, String>,

    /// Full-size photo URLs
    pub images: BTreeSet<String>,

    pub location: Location,
}

/// Where a listing is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,

    /// Address as typed by the lister; may be empty
    pub street: String,

    /// Suburb from the site's structured location; may be empty
    pub suburb: String,
}
