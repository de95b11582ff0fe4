use crate::url::normalize::check_page_url;
use crate::UrlError;
use url::Url;

/// Resolves an href against the page it was found on
///
/// Standard reference resolution applies (`../x`, `/x`, `//host/x`, `?q`).
/// References that can never lead to a page are refused:
/// - empty or fragment-only hrefs (same-page anchors)
/// - `javascript:`, `mailto:`, `tel:` and `data:` schemes
/// - anything that does not resolve to an HTTP(S) URL
///
/// # Examples
///
/// ```
/// use property_trawler::url::resolve;
/// use url::Url;
///
/// let base = Url::parse("https://www.trademe.co.nz/browse/property.aspx?page=1").unwrap();
/// let url = resolve(&base, "/property/residential-property-for-sale/auction-1.htm").unwrap();
/// assert_eq!(
///     url.as_str(),
///     "https://www.trademe.co.nz/property/residential-property-for-sale/auction-1.htm"
/// );
/// ```
pub fn resolve(base: &Url, href: &str) -> Result<Url, UrlError> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return Err(UrlError::Irrelevant(href.to_string()));
    }

    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return Err(UrlError::Irrelevant(href.to_string()));
    }

    let absolute = base.join(href)?;
    check_page_url(&absolute)?;
    Ok(absolute)
}
