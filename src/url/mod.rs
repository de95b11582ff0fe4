//! URL handling module for Property-Trawler
//!
//! This module resolves hrefs found in markup, classifies the results
//! (listing page, next search page, or irrelevant), and computes the
//! canonical forms used as deduplication keys.

mod matcher;
mod normalize;
mod resolve;

use ::url::Url;

// Re-export main functions
pub use matcher::is_listing_url;
pub use normalize::{canonical_key, canonical_listing_url, canonicalize, parse_page_url};
pub use resolve::resolve;

/// What a resolved anchor leads to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// A listing-detail page
    Listing,
    /// The next page of the current search results
    NextPage,
    /// Anything else (navigation, ads, other categories)
    Other,
}

/// The role a frontier URL plays, which decides its canonical form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlRole {
    /// A search-results page; its query string selects the results
    SearchPage,
    /// A listing-detail page; its path alone identifies the listing
    Listing,
}

/// Classifies a resolved anchor target
///
/// The URL shape decides whether it is a listing. Pagination can only be
/// recognised from the anchor itself, so the caller passes the anchor's
/// `rel` attribute as well. A listing URL stays a listing even when the
/// anchor also carries `rel="next"`.
///
/// # Examples
///
/// ```
/// use property_trawler::url::{classify, LinkKind};
/// use url::Url;
///
/// let next = Url::parse("https://example.com/browse?page=2").unwrap();
/// assert_eq!(classify(&next, Some("next")), LinkKind::NextPage);
/// assert_eq!(classify(&next, None), LinkKind::Other);
/// ```
pub fn classify(url: &Url, rel: Option<&str>) -> LinkKind {
    if is_listing_url(url) {
        LinkKind::Listing
    } else if rel.is_some_and(has_next_token) {
        LinkKind::NextPage
    } else {
        LinkKind::Other
    }
}

/// `rel` is a space-separated token list, compared case-insensitively
fn has_next_token(rel: &str) -> bool {
    rel.split_ascii_whitespace()
        .any(|token| token.eq_ignore_ascii_case("next"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_classify_listing() {
        let listing = url("https://www.trademe.co.nz/property/residential-property-for-sale/auction-42.htm");
        assert_eq!(classify(&listing, None), LinkKind::Listing);
        assert_eq!(classify(&listing, Some("next")), LinkKind::Listing);
    }

    #[test]
    fn test_classify_next_page() {
        let page = url("https://www.trademe.co.nz/browse/property.aspx?page=3");
        assert_eq!(classify(&page, Some("next")), LinkKind::NextPage);
        assert_eq!(classify(&page, Some("nofollow NEXT")), LinkKind::NextPage);
    }

    #[test]
    fn test_classify_other() {
        let page = url("https://www.trademe.co.nz/browse/property.aspx?page=3");
        assert_eq!(classify(&page, None), LinkKind::Other);
        assert_eq!(classify(&page, Some("prev")), LinkKind::Other);
        assert_eq!(classify(&page, Some("nextpage")), LinkKind::Other);
    }
}
