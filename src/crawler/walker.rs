//! Search-results page scanning
//!
//! A search page is scanned once, front to back, collecting every anchor
//! that leads to a listing or to the next page of results. Other links are
//! ignored.

use crate::scan::{LexError, TagCursor, Token};
use crate::url::{classify, resolve, LinkKind};
use thiserror::Error;
use url::Url;

/// Marker of the site's own error page, served with a 200 status
const ERROR_PAGE_ID: &str = "ErrorOops";

/// Failure to walk a search page
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WalkError {
    #[error("site returned its error page")]
    BadSearchPage,

    #[error("{0}")]
    Lex(#[from] LexError),
}

/// Links found on one search page, in document order
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SearchPageLinks {
    pub listings: Vec<Url>,
    pub next_pages: Vec<Url>,
}

/// Scans a fetched search page
///
/// `base` is the URL the page was served from and anchors are resolved
/// against it. Scanning stops at `</html>` or the end of the body. Stray
/// undecodable bytes are replaced and scanning carries on. A body cut off
/// mid-character ends the scan with the links found so far; only a cut
/// before the first token fails the walk.
pub fn scan_search_page(body: &[u8], base: &Url) -> Result<SearchPageLinks, WalkError> {
    let mut cursor = TagCursor::new(body);
    let mut links = SearchPageLinks::default();

    loop {
        let token = match cursor.next() {
            Ok(token) => token,
            Err(e) if cursor.tokens_read() > 0 => {
                tracing::debug!("Treating {} on {} as end of page", e, base);
                break;
            }
            Err(e) => return Err(WalkError::Lex(e)),
        };

        let tag = match token {
            Token::Open(tag) | Token::SelfClosing(tag) => tag,
            Token::Close(name) if name == "html" => break,
            Token::EndOfStream => break,
            _ => continue,
        };

        if tag.name() == "div" && tag.attr("id") == Some(ERROR_PAGE_ID) {
            return Err(WalkError::BadSearchPage);
        }

        if tag.name() != "a" {
            continue;
        }
        let Some(href) = tag.attr("href") else { continue };

        let url = match resolve(base, href) {
            Ok(url) => url,
            Err(e) => {
                tracing::trace!("Ignoring link {:?} on {}: {}", href, base, e);
                continue;
            }
        };

        match classify(&url, tag.attr("rel")) {
            LinkKind::Listing => links.listings.push(url),
            LinkKind::NextPage => links.next_pages.push(url),
            LinkKind::Other => {}
        }
    }

    Ok(links)
}
