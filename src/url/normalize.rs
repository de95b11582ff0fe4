use crate::url::UrlRole;
use crate::UrlError;
use url::Url;

/// List of tracking query parameters to remove during normalization
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_eid",
    "ref",
    "source",
];

/// Parses an absolute page URL, rejecting anything that cannot be fetched
///
/// # Examples
///
/// ```
/// use property_trawler::url::parse_page_url;
///
/// let url = parse_page_url("https://WWW.TRADEME.CO.NZ/browse?page=1").unwrap();
/// assert_eq!(url.host_str(), Some("www.trademe.co.nz"));
/// assert!(parse_page_url("ftp://example.com/").is_err());
/// ```
pub fn parse_page_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim())?;
    check_page_url(&url)?;
    Ok(url)
}

/// Checks that an already-parsed URL is an HTTP(S) URL with a host
pub(crate) fn check_page_url(url: &Url) -> Result<(), UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    Ok(())
}

/// Rewrites a URL into the canonical form used for its role
///
/// # Normalization Steps
///
/// Both roles:
/// 1. Host is lowercase (guaranteed by the URL parser)
/// 2. Remove fragment (everything after #)
///
/// Listing pages:
/// 3. Drop the whole query string; a listing is identified by its path
///
/// Search pages:
/// 3. Remove tracking query parameters
/// 4. Sort remaining query parameters alphabetically
/// 5. Remove empty query string (trailing ?)
///
/// # Examples
///
/// ```
/// use property_trawler::url::{canonicalize, UrlRole};
/// use url::Url;
///
/// let url = Url::parse("https://example.com/search?page=2&cid=5&utm_source=x#top").unwrap();
/// assert_eq!(
///     canonicalize(&url, UrlRole::SearchPage).as_str(),
///     "https://example.com/search?cid=5&page=2"
/// );
/// ```
pub fn canonicalize(url: &Url, role: UrlRole) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);

    match role {
        UrlRole::Listing => url.set_query(None),
        UrlRole::SearchPage => {
            if url.query().is_some() {
                let filtered_params = filter_and_sort_query_params(&url);

                if filtered_params.is_empty() {
                    url.set_query(None);
                } else {
                    url.query_pairs_mut()
                        .clear()
                        .extend_pairs(filtered_params.iter());
                }
            }
        }
    }

    url
}

/// The URL a listing is fetched from
pub fn canonical_listing_url(url: &Url) -> Url {
    canonicalize(url, UrlRole::Listing)
}

/// Returns the seen-set key for a URL in the given role
pub fn canonical_key(url: &Url, role: UrlRole) -> String {
    canonicalize(url, role).into()
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    // Stable sort keeps repeated keys in their original relative order
    params.sort_by(|a, b| a.0.cmp(&b.0));

    params
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
