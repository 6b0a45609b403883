//! Storage abstraction for Markflow.
//!
//! The [`BookmarkStore`] trait is the full CRUD contract the request
//! handlers rely on, enabling pluggable backends (SQLite in the
//! application crate, [`memory::InMemoryStore`] here).
//!
//! Implementations must be `Send + Sync` to work with async runtimes and
//! are responsible for their own consistency.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;

use crate::models::{Bookmark, Category, Origin, SEED_ID_PREFIX};

/// Abstract storage backend for bookmarks and user categories.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`list_bookmarks`](BookmarkStore::list_bookmarks) | All bookmarks; order is not meaningful |
/// | [`create_bookmark`](BookmarkStore::create_bookmark) | Insert a user bookmark, assigning an id if absent |
/// | [`bulk_create_bookmarks`](BookmarkStore::bulk_create_bookmarks) | First-run seeding |
/// | [`update_bookmark_rating`](BookmarkStore::update_bookmark_rating) | Set a rating; `None` if unknown id |
/// | [`delete_bookmark`](BookmarkStore::delete_bookmark) | Remove one bookmark |
/// | [`clear_user_bookmarks`](BookmarkStore::clear_user_bookmarks) | Remove user-originated bookmarks only |
/// | [`list_categories`](BookmarkStore::list_categories) | User-created categories (no built-ins) |
/// | [`create_category`](BookmarkStore::create_category) | Insert a category; existing slug is returned as-is |
#[async_trait]
pub trait BookmarkStore: Send + Sync {
    async fn list_bookmarks(&self) -> Result<Vec<Bookmark>>;

    /// Stores a user bookmark and returns the stored record.
    async fn create_bookmark(&self, bookmark: &Bookmark) -> Result<Bookmark>;

    /// Stores seeded bookmarks. Records whose id already exists are
    /// skipped. Returns the number inserted.
    async fn bulk_create_bookmarks(&self, bookmarks: &[Bookmark]) -> Result<usize>;

    async fn update_bookmark_rating(&self, id: &str, rating: f64) -> Result<Option<Bookmark>>;

    /// Returns `false` when no bookmark has this id.
    async fn delete_bookmark(&self, id: &str) -> Result<bool>;

    /// Deletes bookmarks with [`Origin::User`]; seeded ones survive.
    /// Returns the number removed.
    async fn clear_user_bookmarks(&self) -> Result<usize>;

    async fn list_categories(&self) -> Result<Vec<Category>>;

    async fn create_category(&self, category: &Category) -> Result<Category>;
}

/// Returns `bookmark` with an id suitable for `origin`.
///
/// Existing ids are kept. User bookmarks get `user-<millis>-<suffix>`;
/// seeded bookmarks get `seed-<index>`.
pub fn with_assigned_id(bookmark: &Bookmark, origin: Origin, index: usize) -> Bookmark {
    let mut stored = bookmark.clone();
    if stored.id.trim().is_empty() {
        stored.id = match origin {
            Origin::User => Bookmark::generate_id(Utc::now()),
            Origin::Seed => format!("{}{}", SEED_ID_PREFIX, index),
        };
    }
    stored
}
