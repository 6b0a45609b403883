//! Built-in categories, presentation hints, and category listing.
//!
//! The built-in set is a compile-time constant; stores only hold
//! user-created categories. [`merge_categories`] combines the two and
//! optionally attaches bookmark counts.

use crate::models::{Bookmark, Category, CategorySummary};
use crate::normalize::slugify;

/// Built-in categories as `(slug, name)`.
pub const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("development", "Development"),
    ("inspiration", "Inspiration"),
    ("entertainment", "Entertainment"),
    ("design", "Design"),
    ("social-media", "Social Media"),
    ("ai-tool", "AI Tool"),
    ("music", "Music"),
    ("finance", "Finance"),
    ("business", "Business"),
    ("book", "Book"),
];

/// Icon names the presentation layer can render.
pub const CATEGORY_ICONS: &[&str] = &[
    "laptop",
    "brain",
    "briefcase",
    "mobile",
    "dollar",
    "globe",
    "music",
    "documents",
    "books",
    "brain2",
    "camera",
    "gallery",
    "gamepad",
    "lightbulb",
    "mic",
    "compass",
];

/// Category color palette.
pub const CATEGORY_COLORS: &[&str] = &[
    "#ef4444", "#f97316", "#eab308", "#84cc16", "#14b8a6", "#22c55e", "#3b82f6", "#a855f7",
    "#6b7280", "#1e3a8a",
];

/// Icon shown for categories created without one.
pub const DEFAULT_ICON: &str = "briefcase";

/// Color shown for categories created without one.
pub const DEFAULT_COLOR: &str = "#3b82f6";

/// Pseudo-slug that matches every bookmark.
pub const ALL_SLUG: &str = "all";

pub fn is_known_icon(icon: &str) -> bool {
    CATEGORY_ICONS.contains(&icon)
}

pub fn is_palette_color(color: &str) -> bool {
    CATEGORY_COLORS
        .iter()
        .any(|c| c.eq_ignore_ascii_case(color))
}

pub fn is_default_slug(slug: &str) -> bool {
    DEFAULT_CATEGORIES.iter().any(|(s, _)| *s == slug)
}

/// The built-in categories as records.
pub fn default_categories() -> Vec<Category> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|(slug, name)| Category {
            id: slug.to_string(),
            slug: slug.to_string(),
            name: name.to_string(),
            icon: None,
            color: None,
        })
        .collect()
}

/// True if `bookmark` belongs to the category identified by `slug`.
///
/// Matches on `categorySlug`, or on the free-text `category` name
/// normalized the same way slugs are. [`ALL_SLUG`] matches everything.
pub fn bookmark_matches_category(bookmark: &Bookmark, slug: &str) -> bool {
    if slug == ALL_SLUG {
        return true;
    }
    let slug = slugify(slug);
    bookmark.category_slug == slug
        || (!bookmark.category.is_empty() && slugify(&bookmark.category) == slug)
}

/// Built-in categories followed by user categories whose slug does not
/// collide with a built-in one. Counts are attached when `bookmarks` is
/// given.
pub fn merge_categories(user: Vec<Category>, bookmarks: Option<&[Bookmark]>) -> Vec<CategorySummary> {
    let mut merged = default_categories();
    merged.extend(user.into_iter().filter(|c| !is_default_slug(&c.slug)));

    merged
        .into_iter()
        .map(|category| {
            let count = bookmarks.map(|list| {
                list.iter()
                    .filter(|b| bookmark_matches_category(b, &category.slug))
                    .count()
            });
            CategorySummary { category, count }
        })
        .collect()
}
