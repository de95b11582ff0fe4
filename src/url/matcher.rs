use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Path shape of a listing-detail page, e.g.
/// `/property/residential-property-for-sale/auction-1234567.htm`
const LISTING_PATH_PATTERN: &str = r"^/property/residential-property[a-z\-]*/auction-\d+\.htm$";

fn listing_path_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(LISTING_PATH_PATTERN).expect("listing path pattern is valid"))
}

/// Checks if an absolute URL points at a listing-detail page
///
/// Only the path is inspected; query strings and fragments are decoration.
///
/// # Examples
///
/// ```
/// use property_trawler::url::is_listing_url;
/// use url::Url;
///
/// let listing = Url::parse(
///     "https://www.trademe.co.nz/property/residential-property-for-sale/auction-1234.htm?rsqid=9",
/// ).unwrap();
/// assert!(is_listing_url(&listing));
///
/// let search = Url::parse("https://www.trademe.co.nz/browse/property.aspx?page=2").unwrap();
/// assert!(!is_listing_url(&search));
/// ```
pub fn is_listing_url(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https") && listing_path_regex().is_match(url.path())
}
