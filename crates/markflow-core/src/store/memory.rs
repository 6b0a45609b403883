//! In-memory [`BookmarkStore`] implementation for tests and ephemeral runs.
//!
//! Uses `Vec`s behind `std::sync::RwLock`. Insertion order is preserved.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::{Bookmark, Category, Origin};

use super::{with_assigned_id, BookmarkStore};

struct StoredBookmark {
    origin: Origin,
    bookmark: Bookmark,
}

/// In-memory store.
pub struct InMemoryStore {
    bookmarks: RwLock<Vec<StoredBookmark>>,
    categories: RwLock<Vec<Category>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            bookmarks: RwLock::new(Vec::new()),
            categories: RwLock::new(Vec::new()),
        }
    }

    fn read_bookmarks(&self) -> Result<RwLockReadGuard<'_, Vec<StoredBookmark>>> {
        self.bookmarks
            .read()
            .map_err(|_| anyhow!("bookmark lock poisoned"))
    }

    fn write_bookmarks(&self) -> Result<RwLockWriteGuard<'_, Vec<StoredBookmark>>> {
        self.bookmarks
            .write()
            .map_err(|_| anyhow!("bookmark lock poisoned"))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookmarkStore for InMemoryStore {
    async fn list_bookmarks(&self) -> Result<Vec<Bookmark>> {
        Ok(self
            .read_bookmarks()?
            .iter()
            .map(|s| s.bookmark.clone())
            .collect())
    }

    async fn create_bookmark(&self, bookmark: &Bookmark) -> Result<Bookmark> {
        let mut stored = self.write_bookmarks()?;
        let record = with_assigned_id(bookmark, Origin::User, stored.len());
        if stored.iter().any(|s| s.bookmark.id == record.id) {
            anyhow::bail!("bookmark id already exists: {}", record.id);
        }
        stored.push(StoredBookmark {
            origin: Origin::User,
            bookmark: record.clone(),
        });
        Ok(record)
    }

    async fn bulk_create_bookmarks(&self, bookmarks: &[Bookmark]) -> Result<usize> {
        let mut stored = self.write_bookmarks()?;
        let mut inserted = 0;
        for (i, b) in bookmarks.iter().enumerate() {
            let record = with_assigned_id(b, Origin::Seed, i + 1);
            if stored.iter().any(|s| s.bookmark.id == record.id) {
                continue;
            }
            stored.push(StoredBookmark {
                origin: Origin::Seed,
                bookmark: record,
            });
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn update_bookmark_rating(&self, id: &str, rating: f64) -> Result<Option<Bookmark>> {
        let mut stored = self.write_bookmarks()?;
        Ok(stored
            .iter_mut()
            .find(|s| s.bookmark.id == id)
            .map(|s| {
                s.bookmark.rating = rating;
                s.bookmark.clone()
            }))
    }

    async fn delete_bookmark(&self, id: &str) -> Result<bool> {
        let mut stored = self.write_bookmarks()?;
        let before = stored.len();
        stored.retain(|s| s.bookmark.id != id);
        Ok(stored.len() < before)
    }

    async fn clear_user_bookmarks(&self) -> Result<usize> {
        let mut stored = self.write_bookmarks()?;
        let before = stored.len();
        stored.retain(|s| s.origin != Origin::User);
        Ok(before - stored.len())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let categories = self
            .categories
            .read()
            .map_err(|_| anyhow!("category lock poisoned"))?;
        Ok(categories.clone())
    }

    async fn create_category(&self, category: &Category) -> Result<Category> {
        let mut categories = self
            .categories
            .write()
            .map_err(|_| anyhow!("category lock poisoned"))?;
        if let Some(existing) = categories.iter().find(|c| c.slug == category.slug) {
            return Ok(existing.clone());
        }
        categories.push(category.clone());
        Ok(category.clone())
    }
}
