//! SQLite-backed [`BookmarkStore`] implementation.
//!
//! Wraps a [`SqlitePool`] and maps each store operation onto the
//! `bookmarks` / `categories` tables created by [`crate::migrate`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use markflow_core::models::{Bookmark, Category, Origin};
use markflow_core::store::{with_assigned_id, BookmarkStore};

const BOOKMARK_COLUMNS: &str =
    "id, url, name, description, category, category_slug, favicon_domain, logo_url, rating";

/// SQLite implementation of the [`BookmarkStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn get_bookmark(&self, id: &str) -> Result<Option<Bookmark>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM bookmarks WHERE id = ?",
            BOOKMARK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(row_to_bookmark))
    }

    async fn insert(&self, bookmark: &Bookmark, origin: Origin, ignore_existing: bool) -> Result<u64> {
        let verb = if ignore_existing {
            "INSERT OR IGNORE"
        } else {
            "INSERT"
        };
        let result = sqlx::query(&format!(
            "{} INTO bookmarks ({}, origin, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            verb, BOOKMARK_COLUMNS
        ))
        .bind(&bookmark.id)
        .bind(&bookmark.url)
        .bind(&bookmark.name)
        .bind(&bookmark.description)
        .bind(&bookmark.category)
        .bind(&bookmark.category_slug)
        .bind(&bookmark.favicon_domain)
        .bind(&bookmark.logo_url)
        .bind(bookmark.rating)
        .bind(origin.as_str())
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

fn row_to_bookmark(row: &SqliteRow) -> Bookmark {
    Bookmark {
        id: row.get("id"),
        url: row.get("url"),
        name: row.get("name"),
        description: row.get("description"),
        category: row.get("category"),
        category_slug: row.get("category_slug"),
        favicon_domain: row.get("favicon_domain"),
        logo_url: row.get("logo_url"),
        rating: row.get("rating"),
    }
}

#[async_trait]
impl BookmarkStore for SqliteStore {
    async fn list_bookmarks(&self) -> Result<Vec<Bookmark>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM bookmarks ORDER BY created_at, rowid",
            BOOKMARK_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .context("list bookmarks")?;
        Ok(rows.iter().map(row_to_bookmark).collect())
    }

    async fn create_bookmark(&self, bookmark: &Bookmark) -> Result<Bookmark> {
        let record = with_assigned_id(bookmark, Origin::User, 0);
        self.insert(&record, Origin::User, false)
            .await
            .context("insert bookmark")?;
        Ok(record)
    }

    async fn bulk_create_bookmarks(&self, bookmarks: &[Bookmark]) -> Result<usize> {
        let mut inserted = 0;
        for (i, b) in bookmarks.iter().enumerate() {
            let record = with_assigned_id(b, Origin::Seed, i + 1);
            inserted += self
                .insert(&record, Origin::Seed, true)
                .await
                .context("insert seeded bookmark")? as usize;
        }
        Ok(inserted)
    }

    async fn update_bookmark_rating(&self, id: &str, rating: f64) -> Result<Option<Bookmark>> {
        let result = sqlx::query("UPDATE bookmarks SET rating = ? WHERE id = ?")
            .bind(rating)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("update rating")?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_bookmark(id).await
    }

    async fn delete_bookmark(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM bookmarks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("delete bookmark")?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear_user_bookmarks(&self) -> Result<usize> {
        let result = sqlx::query("DELETE FROM bookmarks WHERE origin = ?")
            .bind(Origin::User.as_str())
            .execute(&self.pool)
            .await
            .context("clear user bookmarks")?;
        Ok(result.rows_affected() as usize)
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query(
            "SELECT id, slug, name, icon, color FROM categories ORDER BY created_at, rowid",
        )
        .fetch_all(&self.pool)
        .await
        .context("list categories")?;
        Ok(rows
            .iter()
            .map(|row| Category {
                id: row.get("id"),
                slug: row.get("slug"),
                name: row.get("name"),
                icon: row.get("icon"),
                color: row.get("color"),
            })
            .collect())
    }

    async fn create_category(&self, category: &Category) -> Result<Category> {
        sqlx::query(
            "INSERT OR IGNORE INTO categories (slug, id, name, icon, color, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&category.slug)
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.icon)
        .bind(&category.color)
        .bind(Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await
        .context("insert category")?;

        let row = sqlx::query("SELECT id, slug, name, icon, color FROM categories WHERE slug = ?")
            .bind(&category.slug)
            .fetch_one(&self.pool)
            .await
            .context("read back category")?;
        Ok(Category {
            id: row.get("id"),
            slug: row.get("slug"),
            name: row.get("name"),
            icon: row.get("icon"),
            color: row.get("color"),
        })
    }
}
