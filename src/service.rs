//! Request handling shared by the HTTP server and the CLI.
//!
//! [`BookmarkService`] validates input, delegates to the normalizer and
//! the [`BookmarkStore`], and reports failures as [`MarkflowError`]. It
//! also owns first-load seeding: the first time the bookmark list is
//! found empty, the configured [`SeedSource`] is asked for demo data.
//! Seeding is attempted at most once per process and its failure is
//! logged and otherwise ignored.

use anyhow::Result;
use chrono::Utc;
use log::{error, info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

use markflow_core::categories::merge_categories;
use markflow_core::error::MarkflowError;
use markflow_core::models::{
    Bookmark, BookmarkExport, BookmarkInput, Category, CategoryInput, CategorySummary, PageInfo,
};
use markflow_core::normalize::{normalize_bookmark, normalize_category, valid_rating};
use markflow_core::store::BookmarkStore;
use markflow_core::view::ViewQuery;

use crate::config::Config;
use crate::fetch::PageFetcher;
use crate::seed::{DummyJsonSeedSource, SeedSource};
use crate::sqlite_store::SqliteStore;
use crate::{db, migrate};

pub struct BookmarkService {
    store: Arc<dyn BookmarkStore>,
    fetcher: PageFetcher,
    seed: Option<Arc<dyn SeedSource>>,
    seed_attempted: Mutex<bool>,
}

impl BookmarkService {
    pub fn new(
        store: Arc<dyn BookmarkStore>,
        fetcher: PageFetcher,
        seed: Option<Arc<dyn SeedSource>>,
    ) -> Self {
        Self {
            store,
            fetcher,
            seed,
            seed_attempted: Mutex::new(false),
        }
    }

    /// Opens the SQLite store (running migrations) and wires the fetcher
    /// and, unless disabled, the DummyJSON seed source.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;
        migrate::migrate_pool(&pool).await?;

        let seed: Option<Arc<dyn SeedSource>> = if config.seed.enabled {
            Some(Arc::new(DummyJsonSeedSource::new(&config.seed, &config.fetch)?))
        } else {
            None
        };

        Ok(Self::new(
            Arc::new(SqliteStore::new(pool)),
            PageFetcher::new(&config.fetch)?,
            seed,
        ))
    }

    pub async fn fetch_page_info(&self, url: &str) -> Result<PageInfo, MarkflowError> {
        self.fetcher.fetch_page_info(url).await.map_err(|e| {
            warn!("page fetch for {} failed: {}", url, e);
            e
        })
    }

    /// All bookmarks with `query` applied, seeding first if the store is
    /// empty.
    pub async fn list_bookmarks(&self, query: &ViewQuery) -> Result<Vec<Bookmark>, MarkflowError> {
        let mut bookmarks = self.store.list_bookmarks().await.map_err(store_error)?;
        if bookmarks.is_empty() && self.seed_once().await {
            bookmarks = self.store.list_bookmarks().await.map_err(store_error)?;
        }
        Ok(query.apply(&bookmarks))
    }

    /// Returns true when seeding stored at least one bookmark.
    async fn seed_once(&self) -> bool {
        let Some(source) = &self.seed else {
            return false;
        };
        let mut attempted = self.seed_attempted.lock().await;
        if *attempted {
            return false;
        }
        *attempted = true;

        let seed = match source.fetch_seed().await {
            Ok(seed) => seed,
            Err(e) => {
                warn!("seeding skipped: {:#}", e);
                return false;
            }
        };
        match self.store.bulk_create_bookmarks(&seed).await {
            Ok(inserted) => {
                info!("seeded {} bookmarks", inserted);
                inserted > 0
            }
            Err(e) => {
                warn!("seeding skipped: {:#}", e);
                false
            }
        }
    }

    pub async fn find_bookmark(&self, id: &str) -> Result<Bookmark, MarkflowError> {
        self.store
            .list_bookmarks()
            .await
            .map_err(store_error)?
            .into_iter()
            .find(|b| b.id == id)
            .ok_or_else(|| MarkflowError::not_found("Bookmark not found"))
    }

    pub async fn create_bookmark(&self, input: &BookmarkInput) -> Result<Bookmark, MarkflowError> {
        let bookmark = normalize_bookmark(input)?;
        self.store
            .create_bookmark(&bookmark)
            .await
            .map_err(store_error)
    }

    /// Sets a bookmark's rating. `rating` must be a number in `[0, 5]`.
    pub async fn update_rating(
        &self,
        id: &str,
        rating: Option<&serde_json::Value>,
    ) -> Result<Bookmark, MarkflowError> {
        let rating = rating
            .and_then(valid_rating)
            .ok_or_else(|| MarkflowError::validation("rating must be a number between 0 and 5"))?;
        self.store
            .update_bookmark_rating(id, rating)
            .await
            .map_err(store_error)?
            .ok_or_else(|| MarkflowError::not_found("Bookmark not found"))
    }

    pub async fn delete_bookmark(&self, id: &str) -> Result<(), MarkflowError> {
        if self.store.delete_bookmark(id).await.map_err(store_error)? {
            Ok(())
        } else {
            Err(MarkflowError::not_found("Bookmark not found"))
        }
    }

    /// Removes user-created bookmarks. Seeded ones stay.
    pub async fn clear_user_bookmarks(&self) -> Result<usize, MarkflowError> {
        let removed = self
            .store
            .clear_user_bookmarks()
            .await
            .map_err(store_error)?;
        info!("cleared {} user bookmarks", removed);
        Ok(removed)
    }

    pub async fn export(&self) -> Result<BookmarkExport, MarkflowError> {
        let bookmarks = self.store.list_bookmarks().await.map_err(store_error)?;
        Ok(BookmarkExport {
            bookmarks,
            exported_at: Utc::now(),
        })
    }

    /// Built-in plus user categories, with bookmark counts if requested.
    pub async fn list_categories(
        &self,
        with_counts: bool,
    ) -> Result<Vec<CategorySummary>, MarkflowError> {
        let user = self.store.list_categories().await.map_err(store_error)?;
        if with_counts {
            let bookmarks = self.store.list_bookmarks().await.map_err(store_error)?;
            Ok(merge_categories(user, Some(&bookmarks)))
        } else {
            Ok(merge_categories(user, None))
        }
    }

    pub async fn create_category(&self, input: &CategoryInput) -> Result<Category, MarkflowError> {
        let category = normalize_category(input)?;
        self.store
            .create_category(&category)
            .await
            .map_err(store_error)
    }
}

fn store_error(err: anyhow::Error) -> MarkflowError {
    error!("store failure: {:#}", err);
    MarkflowError::store(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetchConfig;
    use async_trait::async_trait;
    use markflow_core::store::memory::InMemoryStore;
    use markflow_core::view::SortOption;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSeed {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl SeedSource for CountingSeed {
        async fn fetch_seed(&self) -> Result<Vec<Bookmark>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("dataset unreachable");
            }
            Ok(["Alpha", "Bravo"]
                .iter()
                .map(|name| {
                    normalize_bookmark(&BookmarkInput {
                        url: Some(format!("https://{}.dev", name.to_lowercase())),
                        name: Some(name.to_string()),
                        ..Default::default()
                    })
                    .unwrap()
                })
                .collect())
        }
    }

    fn service(seed: Option<Arc<CountingSeed>>) -> BookmarkService {
        BookmarkService::new(
            Arc::new(InMemoryStore::new()),
            PageFetcher::new(&FetchConfig::default()).unwrap(),
            seed.map(|s| s as Arc<dyn SeedSource>),
        )
    }

    fn seed_source(fail: bool) -> Arc<CountingSeed> {
        Arc::new(CountingSeed {
            calls: AtomicUsize::new(0),
            fail,
        })
    }

    fn input(url: &str, name: &str) -> BookmarkInput {
        BookmarkInput {
            url: Some(url.to_string()),
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_empty_list_is_seeded_once() {
        let seed = seed_source(false);
        let svc = service(Some(seed.clone()));

        let first = svc.list_bookmarks(&ViewQuery::default()).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].id, "seed-1");

        svc.clear_user_bookmarks().await.unwrap();
        svc.list_bookmarks(&ViewQuery::default()).await.unwrap();
        assert_eq!(seed.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_seed_failure_is_swallowed() {
        let seed = seed_source(true);
        let svc = service(Some(seed.clone()));
        let list = svc.list_bookmarks(&ViewQuery::default()).await.unwrap();
        assert!(list.is_empty());
        svc.list_bookmarks(&ViewQuery::default()).await.unwrap();
        assert_eq!(seed.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_create_requires_url_and_name() {
        let svc = service(None);
        let err = svc.create_bookmark(&input("", "x")).await.unwrap_err();
        assert_eq!(err.code(), "validation");
        assert!(svc
            .list_bookmarks(&ViewQuery::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_update_rating_rules() {
        let svc = service(None);
        let b = svc
            .create_bookmark(&input("https://a.dev", "A"))
            .await
            .unwrap();

        for bad in [json!(6), json!(-1), json!("3")] {
            let err = svc.update_rating(&b.id, Some(&bad)).await.unwrap_err();
            assert_eq!(err.code(), "validation");
        }
        assert_eq!(
            svc.update_rating(&b.id, None).await.unwrap_err().code(),
            "validation"
        );

        let updated = svc.update_rating(&b.id, Some(&json!(3))).await.unwrap();
        assert_eq!(updated.rating, 3.0);

        let err = svc
            .update_rating("user-1-missing", Some(&json!(2)))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "not_found");
    }

    #[tokio::test]
    async fn test_delete_unknown_is_not_found() {
        let svc = service(None);
        assert_eq!(
            svc.delete_bookmark("nope").await.unwrap_err().code(),
            "not_found"
        );
    }

    #[tokio::test]
    async fn test_list_applies_view_query() {
        let svc = service(None);
        for (name, rating) in [("Alpha", 1), ("charlie", 5), ("Bravo", 3)] {
            let mut i = input(&format!("https://{}.dev", name.to_lowercase()), name);
            i.rating = Some(json!(rating));
            svc.create_bookmark(&i).await.unwrap();
        }
        let query = ViewQuery {
            sort: Some(SortOption::NameDesc),
            ..Default::default()
        };
        let names: Vec<String> = svc
            .list_bookmarks(&query)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, vec!["charlie", "Bravo", "Alpha"]);
    }

    #[tokio::test]
    async fn test_categories_with_counts() {
        let svc = service(None);
        let mut i = input("https://a.dev", "A");
        i.category = Some("Web Dev".to_string());
        svc.create_bookmark(&i).await.unwrap();
        svc.create_category(&CategoryInput {
            name: Some("Web Dev".to_string()),
            icon: Some(json!("code")),
            color: Some(json!(42)),
        })
        .await
        .unwrap();

        let cats = svc.list_categories(true).await.unwrap();
        let web = cats.iter().find(|c| c.category.slug == "web-dev").unwrap();
        assert_eq!(web.count, Some(1));
        assert_eq!(web.category.icon.as_deref(), Some("code"));
        assert_eq!(web.category.color, None);

        assert!(svc
            .list_categories(false)
            .await
            .unwrap()
            .iter()
            .all(|c| c.count.is_none()));
    }
}
