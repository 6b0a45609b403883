//! Entity normalization: raw form/import input → canonical records.
//!
//! Normalization never assigns ids; the store does that on insert.

use url::Url;

use crate::error::MarkflowError;
use crate::models::{Bookmark, BookmarkInput, Category, CategoryInput};

/// Slug used for bookmarks without a category.
pub const DEFAULT_CATEGORY_SLUG: &str = "other";

/// Favicon domain used when a bookmark URL cannot be parsed.
pub const FALLBACK_FAVICON_DOMAIN: &str = "example.com";

/// Lowercases and joins whitespace runs with a single hyphen.
///
/// `"  Web   Dev "` → `"web-dev"`.
pub fn slugify(text: &str) -> String {
    text.split_whitespace()
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// Hostname of `url` without a leading `www.`, or `"example.com"` when the
/// URL is not absolute or has no host.
pub fn favicon_domain(url: &str) -> String {
    Url::parse(url.trim())
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .map(|host| host.strip_prefix("www.").unwrap_or(&host).to_string())
        .filter(|host| !host.is_empty())
        .unwrap_or_else(|| FALLBACK_FAVICON_DOMAIN.to_string())
}

/// Returns the rating if it is a finite number in `[0, 5]`.
pub fn valid_rating(value: &serde_json::Value) -> Option<f64> {
    value
        .as_f64()
        .filter(|r| r.is_finite() && (0.0..=5.0).contains(r))
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Validates and canonicalizes bookmark input.
///
/// # Errors
///
/// [`MarkflowError::Validation`] when `url` or `name` is missing or blank.
pub fn normalize_bookmark(input: &BookmarkInput) -> Result<Bookmark, MarkflowError> {
    let (url, name) = match (trimmed(&input.url), trimmed(&input.name)) {
        (Some(url), Some(name)) => (url, name),
        _ => return Err(MarkflowError::validation("URL and name are required")),
    };

    let explicit_slug = trimmed(&input.category_slug);
    let category = trimmed(&input.category);
    let category_slug = explicit_slug
        .or_else(|| category.as_deref().map(slugify))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY_SLUG.to_string());
    let category = category.unwrap_or_else(|| category_slug.replace('-', " "));

    let rating = input.rating.as_ref().and_then(valid_rating).unwrap_or(0.0);

    Ok(Bookmark {
        id: String::new(),
        favicon_domain: favicon_domain(&url),
        url,
        name,
        description: trimmed(&input.description).unwrap_or_default(),
        category,
        category_slug,
        logo_url: trimmed(&input.logo_url),
        rating,
    })
}

/// Validates and canonicalizes category input.
///
/// `icon` and `color` pass through only when they are strings; the
/// presentation layer supplies defaults otherwise.
///
/// # Errors
///
/// [`MarkflowError::Validation`] when `name` is missing or blank.
pub fn normalize_category(input: &CategoryInput) -> Result<Category, MarkflowError> {
    let name = trimmed(&input.name).ok_or_else(|| MarkflowError::validation("Name is required"))?;
    let slug = slugify(&name);

    let as_text = |v: &Option<serde_json::Value>| {
        v.as_ref()
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
    };

    Ok(Category {
        id: slug.clone(),
        slug,
        name,
        icon: as_text(&input.icon),
        color: as_text(&input.color),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(url: &str, name: &str) -> BookmarkInput {
        BookmarkInput {
            url: Some(url.to_string()),
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let b = normalize_bookmark(&input("https://Example.com/x", "Test")).unwrap();
        assert_eq!(b.favicon_domain, "example.com");
        assert_eq!(b.category_slug, "other");
        assert_eq!(b.category, "other");
        assert_eq!(b.rating, 0.0);
        assert_eq!(b.description, "");
        assert!(b.id.is_empty());
    }

    #[test]
    fn test_missing_url_or_name() {
        assert!(matches!(
            normalize_bookmark(&input("", "Test")),
            Err(MarkflowError::Validation(_))
        ));
        assert!(matches!(
            normalize_bookmark(&input("https://a.dev", "   ")),
            Err(MarkflowError::Validation(_))
        ));
        assert!(normalize_bookmark(&BookmarkInput::default()).is_err());
    }

    #[test]
    fn test_fields_trimmed() {
        let mut i = input("  https://www.rust-lang.org/learn  ", "  Rust  ");
        i.description = Some("  The book  ".to_string());
        let b = normalize_bookmark(&i).unwrap();
        assert_eq!(b.url, "https://www.rust-lang.org/learn");
        assert_eq!(b.name, "Rust");
        assert_eq!(b.description, "The book");
        assert_eq!(b.favicon_domain, "rust-lang.org");
    }

    #[test]
    fn test_slug_resolution_order() {
        let mut i = input("https://a.dev", "A");
        i.category = Some("Web   Dev".to_string());
        let b = normalize_bookmark(&i).unwrap();
        assert_eq!(b.category_slug, "web-dev");
        assert_eq!(b.category, "Web   Dev");

        i.category_slug = Some("design".to_string());
        let b = normalize_bookmark(&i).unwrap();
        assert_eq!(b.category_slug, "design");

        let mut i = input("https://a.dev", "A");
        i.category_slug = Some("social-media".to_string());
        let b = normalize_bookmark(&i).unwrap();
        assert_eq!(b.category, "social media");
    }

    #[test]
    fn test_unparseable_url_falls_back() {
        let b = normalize_bookmark(&input("not a url", "Broken")).unwrap();
        assert_eq!(b.favicon_domain, "example.com");
        assert_eq!(favicon_domain("mailto:someone@example.org"), "example.com");
    }

    #[test]
    fn test_rating_clamping() {
        for (raw, expected) in [
            (json!(3), 3.0),
            (json!(4.5), 4.5),
            (json!(0), 0.0),
            (json!(5), 5.0),
            (json!(6), 0.0),
            (json!(-1), 0.0),
            (json!("3"), 0.0),
            (json!(null), 0.0),
        ] {
            let mut i = input("https://a.dev", "A");
            i.rating = Some(raw.clone());
            let b = normalize_bookmark(&i).unwrap();
            assert_eq!(b.rating, expected, "rating input {}", raw);
        }
    }

    #[test]
    fn test_logo_url_passthrough() {
        let mut i = input("https://a.dev", "A");
        i.logo_url = Some("  ".to_string());
        assert_eq!(normalize_bookmark(&i).unwrap().logo_url, None);
        i.logo_url = Some("https://cdn.a.dev/a.png".to_string());
        assert_eq!(
            normalize_bookmark(&i).unwrap().logo_url.as_deref(),
            Some("https://cdn.a.dev/a.png")
        );
    }

    #[test]
    fn test_normalize_category() {
        let c = normalize_category(&CategoryInput {
            name: Some("  Reading List ".to_string()),
            icon: Some(json!("books")),
            color: Some(json!(42)),
        })
        .unwrap();
        assert_eq!(c.name, "Reading List");
        assert_eq!(c.slug, "reading-list");
        assert_eq!(c.id, "reading-list");
        assert_eq!(c.icon.as_deref(), Some("books"));
        assert_eq!(c.color, None);

        assert!(matches!(
            normalize_category(&CategoryInput::default()),
            Err(MarkflowError::Validation(_))
        ));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Web Dev"), "web-dev");
        assert_eq!(slugify("  AI\tTool  "), "ai-tool");
        assert_eq!(slugify(""), "");
    }
}
