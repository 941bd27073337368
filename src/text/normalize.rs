//! Input normalisation ahead of token estimation.
//!
//! Web-scraped input arrives with markup, HTML entities and JSON-style
//! escaped whitespace. All of that costs tokens without carrying content,
//! so it is removed before the text is measured.
//!
//! Order matters: tags are stripped before entities are decoded so that a
//! decoded `&lt;b&gt;` stays literal text instead of being eaten as a tag.

use quick_xml::escape::resolve_html5_entity;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::OnceLock;

/// Anything bounded by angle brackets that does not itself contain `<`.
const TAG_PATTERN: &str = r"<[^<]*>";

/// Decimal, hexadecimal and named character references. The trailing `;`
/// is optional, as browsers accept it.
const ENTITY_PATTERN: &str = r"&(#[0-9]+;?|#[xX][0-9a-fA-F]+;?|[^\t\n\x0C <&#;]{1,32};?)";

/// Named references that are recognised without a trailing `;`.
const LEGACY_ENTITIES: &[&str] = &[
    "AElig", "AMP", "Aacute", "Acirc", "Agrave", "Aring", "Atilde", "Auml", "COPY", "Ccedil",
    "ETH", "Eacute", "Ecirc", "Egrave", "Euml", "GT", "Iacute", "Icirc", "Igrave", "Iuml", "LT",
    "Ntilde", "Oacute", "Ocirc", "Ograve", "Oslash", "Otilde", "Ouml", "QUOT", "REG", "THORN",
    "Uacute", "Ucirc", "Ugrave", "Uuml", "Yacute", "aacute", "acirc", "acute", "aelig", "agrave",
    "amp", "aring", "atilde", "auml", "brvbar", "ccedil", "cedil", "cent", "copy", "curren",
    "deg", "divide", "eacute", "ecirc", "egrave", "eth", "euml", "frac12", "frac14", "frac34",
    "gt", "iacute", "icirc", "iexcl", "igrave", "iquest", "iuml", "laquo", "lt", "macr",
    "micro", "middot", "nbsp", "not", "ntilde", "oacute", "ocirc", "ograve", "ordf", "ordm",
    "oslash", "otilde", "ouml", "para", "plusmn", "pound", "quot", "raquo", "reg", "sect", "shy",
    "sup1", "sup2", "sup3", "szlig", "thorn", "times", "uacute", "ucirc", "ugrave", "uml", "uuml",
    "yacute", "yen", "yuml",
];

/// Windows-1252 characters for numeric references in `0x80..=0x9F`.
/// Unassigned slots map to themselves.
const CP1252_C1: [char; 32] = [
    '\u{20ac}', '\u{81}', '\u{201a}', '\u{192}', '\u{201e}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{2c6}', '\u{2030}', '\u{160}', '\u{2039}', '\u{152}', '\u{8d}', '\u{17d}', '\u{8f}',
    '\u{90}', '\u{2018}', '\u{2019}', '\u{201c}', '\u{201d}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{2dc}', '\u{2122}', '\u{161}', '\u{203a}', '\u{153}', '\u{9d}', '\u{17e}', '\u{178}',
];

#[allow(clippy::expect_used)]
fn tag_regex() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(TAG_PATTERN).expect("valid regex"))
}

#[allow(clippy::expect_used)]
fn entity_regex() -> &'static Regex {
    static ENTITY: OnceLock<Regex> = OnceLock::new();
    ENTITY.get_or_init(|| Regex::new(ENTITY_PATTERN).expect("valid regex"))
}

/// Normalises raw input text.
///
/// Removes markup tags, decodes HTML entities, turns non-breaking spaces
/// into plain spaces, converts the literal two-character sequences `\n`,
/// `\t` and `\r` into the characters they name, and deletes any remaining
/// backslashes.
///
/// # Examples
///
/// ```
/// use precis::text::normalize;
///
/// let raw = r"<p>Fish &amp; chips</p>\nServed daily";
/// assert_eq!(normalize(raw), "Fish & chips\nServed daily");
/// ```
#[must_use]
pub fn normalize(text: &str) -> String {
    let stripped = strip_tags(text);
    let decoded = decode_entities(&stripped);
    unescape_whitespace(&decoded)
}

/// Removes every `<...>` run in a single pass.
///
/// A run starts at a `<` and extends to the last `>` before the next `<`,
/// so `a<<b>>c` becomes `a<c`.
#[must_use]
pub fn strip_tags(text: &str) -> Cow<'_, str> {
    tag_regex().replace_all(text, "")
}

/// Decodes named and numeric HTML character references the way HTML5
/// parsers do.
///
/// Numeric references to NUL, surrogates or values past U+10FFFF become
/// U+FFFD, `0x80..=0x9F` are read as Windows-1252, and other disallowed
/// control or noncharacter code points are dropped. Named references
/// without `;` resolve when they start with a legacy entity name. Anything
/// else is left untouched.
#[must_use]
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    entity_regex().replace_all(text, |caps: &Captures<'_>| {
        let body = &caps[1];
        match body.strip_prefix('#') {
            Some(numeric) => resolve_numeric(numeric.trim_end_matches(';')),
            None => resolve_named(body),
        }
    })
}

fn resolve_numeric(digits: &str) -> String {
    let code = match digits.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => digits.parse::<u32>(),
    };
    // Overflowing digit runs are past U+10FFFF either way.
    let Ok(code) = code else {
        return char::REPLACEMENT_CHARACTER.to_string();
    };

    match code {
        0 => char::REPLACEMENT_CHARACTER.to_string(),
        0x0D => "\r".to_string(),
        0x80..=0x9F => CP1252_C1[(code - 0x80) as usize].to_string(),
        0x01..=0x08 | 0x0B | 0x0E..=0x1F | 0x7F | 0xFDD0..=0xFDEF => String::new(),
        _ if (code & 0xFFFE) == 0xFFFE && code <= 0x10_FFFF => String::new(),
        _ => char::from_u32(code).map_or_else(|| char::REPLACEMENT_CHARACTER.to_string(), String::from),
    }
}

fn resolve_named(body: &str) -> String {
    let resolved = match body.strip_suffix(';') {
        Some(name) => resolve_html5_entity(name),
        None if LEGACY_ENTITIES.contains(&body) => resolve_html5_entity(body),
        None => None,
    };
    if let Some(value) = resolved {
        return value.to_string();
    }

    // Longest legacy prefix wins; the rest of the run is kept as text.
    for end in (2..body.len()).rev() {
        if let Some(prefix) = body.get(..end)
            && LEGACY_ENTITIES.contains(&prefix)
            && let Some(value) = resolve_html5_entity(prefix)
        {
            return format!("{value}{}", &body[end..]);
        }
    }

    format!("&{body}")
}

/// Replaces non-breaking spaces and reverses backslash escapes.
#[must_use]
pub fn unescape_whitespace(text: &str) -> String {
    text.replace('\u{a0}', " ")
        .replace("\\n", "\n")
        .replace("\\t", "\t")
        .replace("\\r", "\r")
        .replace('\\', "")
}
