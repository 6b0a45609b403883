//! Demo dataset used to populate an empty bookmark list.
//!
//! The default source is the DummyJSON products API: each product becomes
//! a bookmark pointing at its product page, keeping the product's
//! category, rating, and thumbnail.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use markflow_core::models::{Bookmark, BookmarkInput};
use markflow_core::normalize::normalize_bookmark;

use crate::config::{FetchConfig, SeedConfig};

/// Supplies the bookmarks stored on first load.
#[async_trait]
pub trait SeedSource: Send + Sync {
    async fn fetch_seed(&self) -> Result<Vec<Bookmark>>;
}

#[derive(Debug, Deserialize)]
struct ProductPage {
    #[serde(default)]
    products: Vec<Product>,
}

#[derive(Debug, Deserialize)]
struct Product {
    id: u64,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    rating: Option<serde_json::Value>,
    #[serde(default)]
    thumbnail: Option<String>,
}

/// Seed source backed by the DummyJSON products endpoint.
pub struct DummyJsonSeedSource {
    client: reqwest::Client,
    url: String,
    count: usize,
}

impl DummyJsonSeedSource {
    pub fn new(seed: &SeedConfig, fetch: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(fetch.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: seed.url.clone(),
            count: seed.count,
        })
    }
}

#[async_trait]
impl SeedSource for DummyJsonSeedSource {
    async fn fetch_seed(&self) -> Result<Vec<Bookmark>> {
        let page: ProductPage = self
            .client
            .get(&self.url)
            .query(&[("limit", self.count)])
            .send()
            .await
            .with_context(|| format!("seed request to {} failed", self.url))?
            .error_for_status()?
            .json()
            .await
            .context("seed response was not valid product JSON")?;

        Ok(products_to_bookmarks(page.products, self.count))
    }
}

/// Maps products to normalized bookmarks. Products that fail
/// normalization are skipped.
fn products_to_bookmarks(products: Vec<Product>, limit: usize) -> Vec<Bookmark> {
    products
        .into_iter()
        .take(limit)
        .filter_map(|p| {
            let input = BookmarkInput {
                url: Some(format!("https://dummyjson.com/products/{}", p.id)),
                name: Some(p.title),
                description: Some(p.description),
                category: p.category,
                category_slug: None,
                logo_url: p.thumbnail.filter(|t| !t.trim().is_empty()),
                rating: p.rating,
            };
            normalize_bookmark(&input).ok()
        })
        .collect()
}
