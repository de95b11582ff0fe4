//! Listing page extraction
//!
//! A listing page is read in one forward pass. Each step looks for its own
//! marker element, starting where the previous step stopped, so the steps
//! must run in document order:
//!
//! | Step         | Marker                                              |
//! |--------------|-----------------------------------------------------|
//! | main content | `<div id="mainContent">`                            |
//! | title        | `<h1 id="ListingTitle_title">`                      |
//! | price        | `<li id="ListingTitle_classifiedTitlePrice">`       |
//! | images       | every `<img>` up to the attributes table            |
//! | attributes   | `<table id="ListingAttributes">`                    |
//! | description  | `<div id="ListingDescription_ListingDescription">`  |
//! | script       | first `text/javascript` script after a template     |
//!
//! The first step that fails ends the pass and no record is produced.

use crate::listing::error::{ExtractError, StepContext};
use crate::listing::record::{Location, PropertyRecord};
use crate::listing::script::{field, ScriptField};
use crate::listing::ExtractStep;
use crate::scan::{Tag, TagCursor, Token};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;
use url::Url;

/// An element recognised by name and one attribute value
struct Marker {
    tag: &'static str,
    attr: &'static str,
    value: &'static str,
}

impl Marker {
    const fn new(tag: &'static str, attr: &'static str, value: &'static str) -> Self {
        Self { tag, attr, value }
    }

    fn matches(&self, tag: &Tag) -> bool {
        tag.matches(self.tag, self.attr, self.value)
    }
}

const MAIN_CONTENT: Marker = Marker::new("div", "id", "mainContent");
const TITLE: Marker = Marker::new("h1", "id", "ListingTitle_title");
const PRICE: Marker = Marker::new("li", "id", "ListingTitle_classifiedTitlePrice");
const ATTRIBUTES_TABLE: Marker = Marker::new("table", "id", "ListingAttributes");
const DESCRIPTION: Marker = Marker::new("div", "id", "ListingDescription_ListingDescription");
const SCRIPT_TEMPLATE: Marker = Marker::new("script", "type", "text/template");

/// Path segment that marks a gallery thumbnail, and its full-size twin
const THUMBNAIL_SEGMENT: &str = "thumb";
const FULL_SIZE_SEGMENT: &str = "full";

/// Extracts a complete record from a fetched listing page
///
/// `source_url` is recorded on the result and used to resolve relative
/// image paths.
///
/// # Example
///
/// ```no_run
/// use property_trawler::listing::extract_listing;
/// use url::Url;
///
/// let url = Url::parse("https://www.trademe.co.nz/property/residential-property-for-sale/auction-1.htm").unwrap();
/// let body = std::fs::read("listing.html").unwrap();
/// match extract_listing(&url, &body) {
///     Ok(record) => println!("{} at ${}", record.title, record.price),
///     Err(e) => eprintln!("skipped: {}", e),
/// }
/// ```
pub fn extract_listing(source_url: &Url, body: &[u8]) -> Result<PropertyRecord, ExtractError> {
    let mut cursor = TagCursor::new(body);

    if cursor
        .find_tag_with_attr(MAIN_CONTENT.tag, MAIN_CONTENT.attr, MAIN_CONTENT.value)
        .at(ExtractStep::MainContent)?
        .is_none()
    {
        return Err(ExtractError::missing(ExtractStep::MainContent));
    }

    let title = extract_title(&mut cursor)?;
    let price = extract_price(&mut cursor)?;
    let images = extract_images(&mut cursor, source_url)?;
    let attributes = extract_attributes(&mut cursor)?;
    let description = extract_description(&mut cursor)?;
    let (listing_id, location) = extract_script(&mut cursor)?;

    Ok(PropertyRecord {
        listing_id,
        source_url: source_url.to_string(),
        title,
        price,
        description,
        attributes,
        images,
        location,
    })
}

fn extract_title(cursor: &mut TagCursor<'_>) -> Result<String, ExtractError> {
    let step = ExtractStep::Title;
    let title = cursor
        .read_text_from_tag_with_attr(TITLE.tag, TITLE.attr, TITLE.value)
        .at(step)?
        .ok_or_else(|| ExtractError::missing(step))?;

    if title.is_empty() {
        return Err(ExtractError::malformed(step, "title is empty", ""));
    }
    Ok(title)
}

fn extract_price(cursor: &mut TagCursor<'_>) -> Result<f64, ExtractError> {
    let step = ExtractStep::Price;
    if cursor
        .find_tag_with_attr(PRICE.tag, PRICE.attr, PRICE.value)
        .at(step)?
        .is_none()
    {
        return Err(ExtractError::missing(step));
    }

    let text = cursor
        .read_text_until_close(PRICE.tag)
        .at(step)?
        .ok_or_else(|| ExtractError::missing(step))?;

    parse_price(&text)
}

fn price_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$((?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d{2})?)").expect("price pattern is valid")
    })
}

/// Parses the single dollar amount in a price line
///
/// Lines with no amount ("Price by negotiation") or with several
/// ("was $X now $Y") are rejected rather than guessed at.
pub fn parse_price(text: &str) -> Result<f64, ExtractError> {
    let step = ExtractStep::Price;
    let amounts: Vec<&str> = price_regex()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();

    let amount = match amounts.as_slice() {
        [single] => *single,
        [] => return Err(ExtractError::malformed(step, "no price found", text)),
        _ => {
            return Err(ExtractError::malformed(
                step,
                format!("{} prices found, expected one", amounts.len()),
                text,
            ))
        }
    };

    let price: f64 = amount
        .replace(',', "")
        .parse()
        .map_err(|e| ExtractError::malformed(step, format!("invalid amount: {}", e), text))?;

    if !price.is_finite() || price < 0.0 {
        return Err(ExtractError::malformed(step, "price out of range", text));
    }
    Ok(price)
}

/// Collects full-size photo URLs up to the attributes table
///
/// The table's opening tag ends the gallery and is pushed back for the
/// attributes step. Running off the end of the page means the table is
/// missing, which is reported against that step.
fn extract_images(
    cursor: &mut TagCursor<'_>,
    source_url: &Url,
) -> Result<BTreeSet<String>, ExtractError> {
    let mut images = BTreeSet::new();

    loop {
        let token = cursor.next().at(ExtractStep::Images)?;
        if token == Token::EndOfStream {
            return Err(ExtractError::missing(ExtractStep::Attributes));
        }

        if token.as_tag().is_some_and(|tag| ATTRIBUTES_TABLE.matches(tag)) {
            cursor.push_back(token);
            return Ok(images);
        }

        let Some(tag) = token.as_tag() else { continue };
        if tag.name() != "img" {
            continue;
        }
        let Some(src) = tag.attr("src") else { continue };

        match crate::url::resolve(source_url, src) {
            Ok(thumb) => {
                if let Some(full) = full_size_url(&thumb) {
                    images.insert(full.into());
                }
            }
            Err(e) => tracing::trace!("Ignoring image {:?}: {}", src, e),
        }
    }
}

/// Rewrites a gallery thumbnail URL to its full-size counterpart
///
/// Returns `None` for images that are not thumbnails (logos, icons, agent
/// photos). Query and fragment are dropped, so responsive variants of one
/// thumbnail collapse to the same URL.
///
/// # Examples
///
/// ```
/// use property_trawler::listing::full_size_url;
/// use url::Url;
///
/// let thumb = Url::parse("https://trademe.tmcdn.co.nz/photoserver/thumb/a.jpg?x=1").unwrap();
/// assert_eq!(
///     full_size_url(&thumb).unwrap().as_str(),
///     "https://trademe.tmcdn.co.nz/photoserver/full/a.jpg"
/// );
/// ```
pub fn full_size_url(thumb: &Url) -> Option<Url> {
    let segments: Vec<&str> = thumb.path_segments()?.collect();
    let position = segments.iter().position(|s| *s == THUMBNAIL_SEGMENT)?;

    // The thumbnail directory must be followed by a file name
    if segments.get(position + 1).map_or(true, |name| name.is_empty()) {
        return None;
    }

    let path = segments
        .iter()
        .enumerate()
        .map(|(i, segment)| if i == position { FULL_SIZE_SEGMENT } else { *segment })
        .collect::<Vec<_>>()
        .join("/");

    let mut full = thumb.clone();
    full.set_path(&format!("/{}", path));
    full.set_query(None);
    full.set_fragment(None);
    Some(full)
}

/// Pairs each header cell with the data cell that follows it
fn extract_attributes(
    cursor: &mut TagCursor<'_>,
) -> Result<BTreeMap<String, String>, ExtractError> {
    let step = ExtractStep::Attributes;
    if cursor
        .find_tag_with_attr(ATTRIBUTES_TABLE.tag, ATTRIBUTES_TABLE.attr, ATTRIBUTES_TABLE.value)
        .at(step)?
        .is_none()
    {
        return Err(ExtractError::missing(step));
    }

    let mut attributes = BTreeMap::new();
    let mut label: Option<String> = None;

    loop {
        match cursor.next().at(step)? {
            Token::Open(tag) if tag.name() == "th" => {
                let text = read_cell(cursor, "th")?;
                label = Some(text.trim_end_matches(':').trim_end().to_string());
            }
            Token::Open(tag) if tag.name() == "td" => {
                let value = read_cell(cursor, "td")?;
                match label.take() {
                    Some(name) if !name.is_empty() => {
                        attributes.insert(name, value);
                    }
                    _ => tracing::trace!("Ignoring attribute value without a label: {:?}", value),
                }
            }
            Token::Close(name) if name == "table" => return Ok(attributes),
            Token::EndOfStream => {
                return Err(ExtractError::malformed(
                    step,
                    "attributes table is never closed",
                    "",
                ))
            }
            _ => {}
        }
    }
}

fn read_cell(cursor: &mut TagCursor<'_>, cell: &str) -> Result<String, ExtractError> {
    let step = ExtractStep::Attributes;
    cursor
        .read_text_until_close(cell)
        .at(step)?
        .map(|text| collapse_whitespace(&text))
        .ok_or_else(|| ExtractError::malformed(step, format!("<{}> is never closed", cell), ""))
}

fn extract_description(cursor: &mut TagCursor<'_>) -> Result<String, ExtractError> {
    let step = ExtractStep::Description;
    if cursor
        .find_tag_with_attr(DESCRIPTION.tag, DESCRIPTION.attr, DESCRIPTION.value)
        .at(step)?
        .is_none()
    {
        return Err(ExtractError::missing(step));
    }

    let text = cursor
        .read_text_until_close(DESCRIPTION.tag)
        .at(step)?
        .ok_or_else(|| ExtractError::malformed(step, "description is never closed", ""))?;

    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    Ok(lines.join("\n").trim().to_string())
}

/// Finds the listing script and reads the id and coordinates from it
fn extract_script(cursor: &mut TagCursor<'_>) -> Result<(String, Location), ExtractError> {
    let step = ExtractStep::Script;
    if cursor
        .find_tag_with_attr(SCRIPT_TEMPLATE.tag, SCRIPT_TEMPLATE.attr, SCRIPT_TEMPLATE.value)
        .at(step)?
        .is_none()
    {
        return Err(ExtractError::missing(step));
    }

    loop {
        let tag = cursor
            .next_open_tag()
            .at(step)?
            .ok_or_else(|| ExtractError::missing(step))?;
        if tag.name() == "script"
            && tag.attr("type") == Some("text/javascript")
            && tag.attr("src").is_none()
        {
            break;
        }
    }

    let source = cursor.read_text().at(step)?;
    parse_listing_script(&source)
}

/// Reads the listing id and location out of the listing script source
pub fn parse_listing_script(source: &str) -> Result<(String, Location), ExtractError> {
    let step = ExtractStep::Script;

    let listing_id = field(source, ScriptField::ListingId)
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ExtractError::malformed(step, "listingId not found", source))?;

    let latitude = coordinate(source, ScriptField::Latitude, 90.0)?;
    let longitude = coordinate(source, ScriptField::Longitude, 180.0)?;

    let location = Location {
        latitude,
        longitude,
        street: field(source, ScriptField::Street)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
        suburb: field(source, ScriptField::Suburb)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    };

    Ok((listing_id, location))
}

/// Decimal degrees within `[-limit, limit]`
fn coordinate(source: &str, which: ScriptField, limit: f64) -> Result<f64, ExtractError> {
    let step = ExtractStep::Script;
    let raw = field(source, which).ok_or_else(|| {
        ExtractError::malformed(step, format!("{} not found", which.key()), source)
    })?;

    let value: f64 = raw.trim().parse().map_err(|e| {
        ExtractError::malformed(step, format!("invalid {}: {}", which.key(), e), &raw)
    })?;

    if !value.is_finite() || value.abs() > limit {
        return Err(ExtractError::malformed(
            step,
            format!("{} out of range", which.key()),
            &raw,
        ));
    }
    Ok(value)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
