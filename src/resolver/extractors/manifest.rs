// Manifest URL extraction from arbitrary page text
//
// Pages hide the HLS manifest in several ways:
// - Plain URL in a script or attribute
// - JSON-escaped URL (https:\/\/host\/a.m3u8)
// - Base64 string literal that decodes to something containing the URL

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use regex::Regex;

lazy_static::lazy_static! {
    /// http(s) URL ending in .m3u8 with an optional query string
    static ref MANIFEST_RE: Regex = Regex::new(
        r#"https?://[^\s"'<>]+?\.m3u8(?:[?&][^\s"'<>]*)?"#
    ).unwrap();
    /// Quoted run of base64 alphabet, at least 20 chars
    static ref BASE64_TOKEN_RE: Regex = Regex::new(r#""([A-Za-z0-9+/=]{20,})""#).unwrap();
}

/// Standard alphabet that accepts tokens with or without trailing `=`
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Where a manifest URL was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    /// Present in the text (after unescaping `\/`)
    Literal,
    /// Inside a base64 string literal
    Encoded,
}

/// Find a manifest URL in `text`.
pub fn extract_manifest_url(text: &str) -> Option<String> {
    extract_with_source(text).map(|(url, _)| url)
}

/// Same as [`extract_manifest_url`], also reporting which path matched.
pub fn extract_with_source(text: &str) -> Option<(String, MatchSource)> {
    if text.is_empty() {
        return None;
    }

    let clean = text.replace(r"\/", "/");

    if let Some(m) = MANIFEST_RE.find(&clean) {
        return Some((m.as_str().to_string(), MatchSource::Literal));
    }

    for caps in BASE64_TOKEN_RE.captures_iter(&clean) {
        let token = &caps[1];
        let Some(decoded) = decode_token(token) else {
            continue;
        };
        if !decoded.contains(".m3u8") {
            continue;
        }
        if let Some(m) = MANIFEST_RE.find(&decoded) {
            return Some((m.as_str().to_string(), MatchSource::Encoded));
        }
    }

    None
}

/// Decode a base64 token into UTF-8 text; `None` for anything that is not.
fn decode_token(token: &str) -> Option<String> {
    let bytes = LENIENT_BASE64.decode(token).ok()?;
    String::from_utf8(bytes).ok()
}
