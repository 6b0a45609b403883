//! Best-effort page metadata extraction from raw HTML.
//!
//! A bounded heuristic built from ordered regex fallbacks rather than a
//! full HTML parser. Pages that render their title or description with
//! JavaScript come back as `"Untitled"` / empty description; that is a
//! successful result, not an error.
//!
//! # Resolution order
//!
//! | Field | Sources, first non-empty wins |
//! |-------|-------------------------------|
//! | title | `<title>` text → `og:title` → `"Untitled"` |
//! | description | `og:description` → `name="description"` → `twitter:description` → title (if found) → `""` |
//!
//! Meta lookup accepts the `property`/`name` and `content` attributes in
//! either order, single- or double-quoted.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use crate::models::PageInfo;

/// Title used when a page has neither `<title>` nor `og:title`.
pub const UNTITLED: &str = "Untitled";

/// Maximum description length in characters, ellipsis included.
pub const MAX_DESCRIPTION_CHARS: usize = 500;

const ELLIPSIS: &str = "...";

fn title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid title regex"))
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid tag regex"))
}

fn entity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)&(?:#x([0-9a-f]+)|#([0-9]+)|(amp|lt|gt|quot|apos|nbsp));")
            .expect("valid entity regex")
    })
}

/// Extracts `{title, description}` from an HTML document.
pub fn extract_page_info(html: &str) -> PageInfo {
    let mut title = extract_title(html).unwrap_or_default();
    if title.is_empty() {
        title = meta_content(html, "property", "og:title").unwrap_or_default();
    }
    let found_title = !title.is_empty();
    if !found_title {
        title = UNTITLED.to_string();
    }

    let description = meta_content(html, "property", "og:description")
        .or_else(|| meta_content(html, "name", "description"))
        .or_else(|| meta_content(html, "name", "twitter:description"))
        .or_else(|| found_title.then(|| title.clone()))
        .unwrap_or_default();

    PageInfo {
        title,
        description: truncate_description(&description),
    }
}

/// Text of the first `<title>` element with inner tags stripped and
/// entities decoded. `None` if absent or empty.
fn extract_title(html: &str) -> Option<String> {
    let caps = title_re().captures(html)?;
    let stripped = tag_re().replace_all(&caps[1], "");
    let decoded = decode_entities(stripped.trim());
    (!decoded.is_empty()).then_some(decoded)
}

/// Compiled lookups for one `(attr, value)` key: key before `content`,
/// then `content` before key. Both attribute names must start at
/// whitespace so `data-name="description"` is not read as `name`.
fn meta_patterns(attr: &str, value: &str) -> Option<[Regex; 2]> {
    type Cache = Mutex<HashMap<(String, String), [Regex; 2]>>;
    static CACHE: OnceLock<Cache> = OnceLock::new();

    let cache = CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    let key = (attr.to_ascii_lowercase(), value.to_ascii_lowercase());
    let mut cache = cache.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(patterns) = cache.get(&key) {
        return Some(patterns.clone());
    }

    let key_attr = format!(
        r#"(?:^|\s){}\s*=\s*["']{}["']"#,
        regex::escape(&key.0),
        regex::escape(&key.1)
    );
    let content = r#"(?:^|\s)content\s*=\s*(?:"([^"]*)"|'([^']*)')"#;
    let patterns = [
        Regex::new(&format!(r"(?i){}[^>]*?{}", key_attr, content)).ok()?,
        Regex::new(&format!(r"(?i){}[^>]*?{}", content, key_attr)).ok()?,
    ];
    cache.insert(key, patterns.clone());
    Some(patterns)
}

/// Content of a `<meta {attr}="{value}" content="...">` tag, decoded.
///
/// Returns `None` when no matching tag exists or its content is empty.
pub fn meta_content(html: &str, attr: &str, value: &str) -> Option<String> {
    for re in &meta_patterns(attr, value)? {
        if let Some(caps) = re.captures(html) {
            let raw = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str());
            if let Some(raw) = raw {
                let decoded = decode_entities(raw.trim());
                if !decoded.is_empty() {
                    return Some(decoded);
                }
            }
        }
    }
    None
}

/// Decodes the named entities Markflow understands plus decimal and hex
/// character references, then trims. Unknown or invalid references are
/// left untouched.
pub fn decode_entities(text: &str) -> String {
    let decoded = entity_re().replace_all(text, |caps: &Captures| {
        let whole = caps[0].to_string();
        if let Some(hex) = caps.get(1) {
            return u32::from_str_radix(hex.as_str(), 16)
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or(whole);
        }
        if let Some(dec) = caps.get(2) {
            return dec
                .as_str()
                .parse::<u32>()
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or(whole);
        }
        match caps[3].to_ascii_lowercase().as_str() {
            "amp" => "&",
            "lt" => "<",
            "gt" => ">",
            "quot" => "\"",
            "apos" => "'",
            "nbsp" => " ",
            _ => return whole,
        }
        .to_string()
    });
    decoded.trim().to_string()
}

/// Caps a description at [`MAX_DESCRIPTION_CHARS`], cutting to 497
/// characters plus `"..."` when longer.
pub fn truncate_description(text: &str) -> String {
    if text.chars().count() <= MAX_DESCRIPTION_CHARS {
        return text.to_string();
    }
    let keep = MAX_DESCRIPTION_CHARS - ELLIPSIS.len();
    let head: String = text.chars().take(keep).collect();
    format!("{}{}", head.trim(), ELLIPSIS)
}
