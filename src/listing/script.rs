//! Field lookup in a listing's inline script
//!
//! The script is a hand-written object literal, not JSON: keys are bare,
//! values are quoted with either quote style or left unquoted. Fields are
//! therefore located by pattern rather than parsed.

use regex::Regex;
use std::sync::OnceLock;

/// The script fields a listing record is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptField {
    ListingId,
    Latitude,
    Longitude,
    Street,
    Suburb,
}

impl ScriptField {
    const ALL: [ScriptField; 5] = [
        ScriptField::ListingId,
        ScriptField::Latitude,
        ScriptField::Longitude,
        ScriptField::Street,
        ScriptField::Suburb,
    ];

    /// Key as written in the script
    pub fn key(self) -> &'static str {
        match self {
            ScriptField::ListingId => "listingId",
            ScriptField::Latitude => "lat",
            ScriptField::Longitude => "lng",
            ScriptField::Street => "userEnteredLocation",
            ScriptField::Suburb => "structuredLocation",
        }
    }
}

/// Value of a known field, quotes removed and escapes decoded
///
/// The first occurrence wins. `None` if the key does not appear.
pub fn field(script: &str, which: ScriptField) -> Option<String> {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    let patterns = PATTERNS.get_or_init(|| {
        ScriptField::ALL
            .iter()
            .map(|f| build_field_regex(f.key()))
            .collect()
    });
    let index = ScriptField::ALL.iter().position(|f| *f == which)?;
    capture_value(&patterns[index], script)
}

/// Value of an arbitrary `key: value` pair
pub fn lookup(script: &str, key: &str) -> Option<String> {
    capture_value(&build_field_regex(key), script)
}

fn capture_value(re: &Regex, script: &str) -> Option<String> {
    let caps = re.captures(script)?;

    if let Some(double) = caps.name("dq") {
        Some(unescape(double.as_str()))
    } else if let Some(single) = caps.name("sq") {
        Some(unescape(single.as_str()))
    } else {
        caps.name("bare").map(|bare| bare.as_str().to_string())
    }
}

fn build_field_regex(key: &str) -> Regex {
    // `key` must be a whole identifier (so `lat` does not match `flat`),
    // optionally quoted itself, followed by `:` and one value.
    let pattern = format!(
        r#"(?:^|[^A-Za-z0-9_$])["']?{key}["']?\s*:\s*(?:"(?P<dq>(?:[^"\\]|\\.)*)"|'(?P<sq>(?:[^'\\]|\\.)*)'|(?P<bare>[^,\s}}\]\)]+))"#,
        key = regex::escape(key)
    );
    Regex::new(&pattern).expect("field pattern is valid")
}

/// Decodes the escapes a JS string literal may contain
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = r#"
        var listing = {
            listingId: 123456,
            lat: -41.123, lng: "174.456",
            flat: 9,
            userEnteredLocation: "12 Main St",
            structuredLocation: 'Suburbia',
            note: "She said \"hi\"!"
        };
    "#;

    #[test]
    fn test_unquoted_value() {
        assert_eq!(field(SCRIPT, ScriptField::ListingId).as_deref(), Some("123456"));
        assert_eq!(field(SCRIPT, ScriptField::Latitude).as_deref(), Some("-41.123"));
    }

    #[test]
    fn test_quoted_values() {
        assert_eq!(field(SCRIPT, ScriptField::Longitude).as_deref(), Some("174.456"));
        assert_eq!(field(SCRIPT, ScriptField::Street).as_deref(), Some("12 Main St"));
        assert_eq!(field(SCRIPT, ScriptField::Suburb).as_deref(), Some("Suburbia"));
    }

    #[test]
    fn test_escapes_decoded() {
        assert_eq!(lookup(SCRIPT, "note").as_deref(), Some("She said \"hi\"!"));
    }

    #[test]
    fn test_key_must_be_whole_identifier() {
        let script = "{ flat: 9, plateau: 3 }";
        assert_eq!(field(script, ScriptField::Latitude), None);
    }

    #[test]
    fn test_quoted_key() {
        assert_eq!(field(r#"{"listingId": "77"}"#, ScriptField::ListingId).as_deref(), Some("77"));
    }

    #[test]
    fn test_missing_key() {
        assert_eq!(lookup(SCRIPT, "agentId"), None);
    }
}
