//! Core data models used throughout Markflow.
//!
//! These types represent the bookmarks and categories that flow between
//! the normalizer, the store, and the HTTP/CLI surfaces. Wire format is
//! camelCase JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix of ids assigned to user-created bookmarks.
pub const USER_ID_PREFIX: &str = "user-";

/// Prefix of ids assigned to bookmarks seeded from the demo dataset.
pub const SEED_ID_PREFIX: &str = "seed-";

/// Favicon service used when a bookmark has no explicit logo.
const FAVICON_SERVICE: &str = "https://www.google.com/s2/favicons";

/// A saved bookmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    /// `user-<epoch-millis>-<suffix>` for user entries. Empty until stored.
    #[serde(default)]
    pub id: String,
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub category_slug: String,
    pub favicon_domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub rating: f64,
}

impl Bookmark {
    /// Generates a user bookmark id embedding the creation time.
    ///
    /// The recency sort parses the millisecond timestamp back out of the
    /// id (see [`id_timestamp`]), so the format must stay
    /// `user-<millis>-<suffix>`.
    pub fn generate_id(now: DateTime<Utc>) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("{}{}-{}", USER_ID_PREFIX, now.timestamp_millis(), &suffix[..7])
    }

    /// URL of the icon to render: the explicit logo, or the favicon service.
    pub fn icon_url(&self) -> String {
        match &self.logo_url {
            Some(logo) => logo.clone(),
            None => format!("{}?domain={}&sz=64", FAVICON_SERVICE, self.favicon_domain),
        }
    }
}

/// Extracts the creation timestamp (epoch millis) from a user bookmark id.
///
/// Returns 0 for ids without a parseable `user-<digits>` prefix, which
/// makes seeded and foreign records sort as oldest.
pub fn id_timestamp(id: &str) -> i64 {
    let Some(rest) = id.strip_prefix(USER_ID_PREFIX) else {
        return 0;
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// Where a stored bookmark came from.
///
/// Not part of the wire format; stores keep it alongside each record so
/// that clearing user bookmarks leaves seeded records in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    User,
    Seed,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::User => "user",
            Origin::Seed => "seed",
        }
    }
}

/// Raw bookmark input from a form, the CLI, or a seed source.
///
/// `rating` is kept as a raw JSON value: anything other than a number in
/// `[0, 5]` is stored as 0 rather than rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkInput {
    pub url: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub category_slug: Option<String>,
    pub logo_url: Option<String>,
    pub rating: Option<serde_json::Value>,
}

/// A bookmark category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub slug: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Raw category input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryInput {
    pub name: Option<String>,
    pub icon: Option<serde_json::Value>,
    pub color: Option<serde_json::Value>,
}

/// A category as listed to clients, optionally with its bookmark count.
#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    #[serde(flatten)]
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

/// Result of scraping a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    pub title: String,
    pub description: String,
}

/// Downloadable export of the bookmark list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkExport {
    pub bookmarks: Vec<Bookmark>,
    pub exported_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_generated_id_roundtrips_timestamp() {
        let now = Utc.timestamp_millis_opt(1_738_123_456_789).unwrap();
        let id = Bookmark::generate_id(now);
        assert!(id.starts_with("user-1738123456789-"));
        assert_eq!(id_timestamp(&id), 1_738_123_456_789);
    }

    #[test]
    fn test_id_timestamp_unparseable() {
        assert_eq!(id_timestamp("seed-4"), 0);
        assert_eq!(id_timestamp("user-abc"), 0);
        assert_eq!(id_timestamp(""), 0);
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let b = Bookmark {
            id: "user-1-abc".to_string(),
            url: "https://example.com".to_string(),
            name: "Example".to_string(),
            description: String::new(),
            category: "other".to_string(),
            category_slug: "other".to_string(),
            favicon_domain: "example.com".to_string(),
            logo_url: None,
            rating: 0.0,
        };
        let v = serde_json::to_value(&b).unwrap();
        assert_eq!(v["categorySlug"], "other");
        assert_eq!(v["faviconDomain"], "example.com");
        assert!(v.get("logoUrl").is_none());
    }

    #[test]
    fn test_icon_url_prefers_logo() {
        let mut b: Bookmark = serde_json::from_value(serde_json::json!({
            "url": "https://github.com",
            "name": "GitHub",
            "categorySlug": "development",
            "faviconDomain": "github.com"
        }))
        .unwrap();
        assert_eq!(
            b.icon_url(),
            "https://www.google.com/s2/favicons?domain=github.com&sz=64"
        );
        b.logo_url = Some("https://cdn.example.com/logo.png".to_string());
        assert_eq!(b.icon_url(), "https://cdn.example.com/logo.png");
    }
}
