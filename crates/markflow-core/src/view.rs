//! Client view logic: sorting, category filtering, and text search over
//! an in-memory bookmark list.
//!
//! Everything here is derived; nothing is persisted. Sorting is stable.

use std::cmp::Ordering;
use std::str::FromStr;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::categories::bookmark_matches_category;
use crate::models::{id_timestamp, Bookmark};

/// The single active sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOption {
    /// Newest first, using the timestamp embedded in user ids.
    RecentlyAdded,
    #[default]
    RatingDesc,
    RatingAsc,
    NameAsc,
    NameDesc,
}

impl SortOption {
    pub const ALL: [SortOption; 5] = [
        SortOption::RecentlyAdded,
        SortOption::RatingDesc,
        SortOption::RatingAsc,
        SortOption::NameAsc,
        SortOption::NameDesc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOption::RecentlyAdded => "recently-added",
            SortOption::RatingDesc => "rating-desc",
            SortOption::RatingAsc => "rating-asc",
            SortOption::NameAsc => "name-asc",
            SortOption::NameDesc => "name-desc",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortOption::RecentlyAdded => "Recently added",
            SortOption::RatingDesc => "Rating: High to Low",
            SortOption::RatingAsc => "Rating: Low to High",
            SortOption::NameAsc => "Name: A to Z",
            SortOption::NameDesc => "Name: Z to A",
        }
    }
}

impl FromStr for SortOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortOption::ALL
            .into_iter()
            .find(|o| o.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "unknown sort '{}'; expected one of: {}",
                    s,
                    SortOption::ALL.map(|o| o.as_str()).join(", ")
                )
            })
    }
}

impl std::fmt::Display for SortOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primary collation key: decomposed, combining marks dropped, lowercased.
fn base_letters(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Locale-aware name comparison.
///
/// Compares on base letters first, so accents and case are ignored and
/// `Éclair` lands between `apple` and `Zebra`. Ties are broken by the
/// accented form, then lowercase before uppercase.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(&base_letters(b))
        .then_with(|| {
            let folded = |s: &str| -> String { s.nfd().flat_map(char::to_lowercase).collect() };
            folded(a).cmp(&folded(b))
        })
        .then_with(|| {
            let flip = |s: &str| -> String {
                s.chars()
                    .map(|c| {
                        if c.is_lowercase() {
                            c.to_uppercase().next().unwrap_or(c)
                        } else {
                            c.to_lowercase().next().unwrap_or(c)
                        }
                    })
                    .collect()
            };
            flip(a).cmp(&flip(b))
        })
}

fn compare_ratings(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Returns a sorted copy of `bookmarks`.
pub fn sort_bookmarks(bookmarks: &[Bookmark], sort: SortOption) -> Vec<Bookmark> {
    let mut list = bookmarks.to_vec();
    match sort {
        SortOption::RecentlyAdded => {
            list.sort_by_key(|b| std::cmp::Reverse(id_timestamp(&b.id)))
        }
        SortOption::RatingDesc => list.sort_by(|a, b| compare_ratings(b.rating, a.rating)),
        SortOption::RatingAsc => list.sort_by(|a, b| compare_ratings(a.rating, b.rating)),
        SortOption::NameAsc => list.sort_by(|a, b| compare_names(&a.name, &b.name)),
        SortOption::NameDesc => list.sort_by(|a, b| compare_names(&b.name, &a.name)),
    }
    list
}

/// Case-insensitive substring match against name or description.
/// An empty query matches everything.
pub fn matches_search(bookmark: &Bookmark, query: &str) -> bool {
    let q = query.trim().to_lowercase();
    q.is_empty()
        || bookmark.name.to_lowercase().contains(&q)
        || bookmark.description.to_lowercase().contains(&q)
}

/// Optional view parameters applied to a bookmark list.
#[derive(Debug, Clone, Default)]
pub struct ViewQuery {
    pub sort: Option<SortOption>,
    /// Category slugs; a bookmark is kept if it matches any of them.
    /// Empty keeps everything.
    pub category: Vec<String>,
    pub search: Option<String>,
}

impl ViewQuery {
    /// Filters by category and search term, then sorts.
    ///
    /// Without an explicit sort the input order is kept.
    pub fn apply(&self, bookmarks: &[Bookmark]) -> Vec<Bookmark> {
        let filtered: Vec<Bookmark> = bookmarks
            .iter()
            .filter(|b| self.matches_categories(b))
            .filter(|b| self.search.as_deref().map_or(true, |q| matches_search(b, q)))
            .cloned()
            .collect();
        match self.sort {
            Some(sort) => sort_bookmarks(&filtered, sort),
            None => filtered,
        }
    }

    fn matches_categories(&self, bookmark: &Bookmark) -> bool {
        self.category.is_empty()
            || self
                .category
                .iter()
                .any(|slug| bookmark_matches_category(bookmark, slug))
    }
}

/// Splits raw `category` values (repeated or comma separated) into slugs.
pub fn parse_category_list<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .flat_map(|v| {
            v.as_ref()
                .split(',')
                .map(|s| s.trim().to_string())
                .collect::<Vec<_>>()
        })
        .filter(|s| !s.is_empty())
        .collect()
}
