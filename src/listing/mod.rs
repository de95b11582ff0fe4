//! Listing pages: extraction into [`PropertyRecord`]s

mod error;
mod extractor;
mod record;
pub mod script;

pub use error::{ExtractError, ExtractFailure, ExtractStep};
pub use extractor::{extract_listing, full_size_url, parse_listing_script, parse_price};
pub use record::{Location, PropertyRecord};
