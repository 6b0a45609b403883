//! Outbound page-metadata fetch.
//!
//! [`PageFetcher`] downloads a page with a browser-like `User-Agent`,
//! follows up to 10 redirects, and hands the body to
//! [`markflow_core::extract::extract_page_info`]. Every failure is an
//! [`MarkflowError::UpstreamFetch`] classified by [`FetchFailure`].

use anyhow::Result;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use std::time::Duration;

use markflow_core::error::{FetchFailure, MarkflowError};
use markflow_core::extract::extract_page_info;
use markflow_core::models::PageInfo;

use crate::config::{Config, FetchConfig};

const MAX_REDIRECTS: usize = 10;

/// `Accept` sent with every page fetch.
pub const ACCEPT_HEADER: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
/// `Accept-Language` sent with every page fetch.
pub const ACCEPT_LANGUAGE_HEADER: &str = "en-US,en;q=0.9";

/// HTTP client for scraping bookmark metadata.
#[derive(Clone)]
pub struct PageFetcher {
    client: reqwest::Client,
}

impl PageFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HEADER));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_HEADER));

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(Self { client })
    }

    /// Fetches `url` and extracts its title and description.
    pub async fn fetch_page_info(&self, url: &str) -> Result<PageInfo, MarkflowError> {
        let target = parse_http_url(url)?;

        let response = self
            .client
            .get(target)
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(MarkflowError::fetch(
                FetchFailure::Status(status.as_u16()),
                format!("Failed to fetch: {}", status),
            ));
        }

        let html = response.text().await.map_err(classify_request_error)?;
        Ok(extract_page_info(&html))
    }
}

/// Accepts only absolute `http`/`https` URLs.
fn parse_http_url(raw: &str) -> Result<url::Url, MarkflowError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(MarkflowError::fetch(FetchFailure::InvalidUrl, "URL is required"));
    }
    let parsed = url::Url::parse(trimmed)
        .map_err(|_| MarkflowError::fetch(FetchFailure::InvalidUrl, "Invalid URL"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(MarkflowError::fetch(
            FetchFailure::InvalidUrl,
            format!("Unsupported URL scheme: {}", other),
        )),
    }
}

fn classify_request_error(err: reqwest::Error) -> MarkflowError {
    if err.is_timeout() {
        MarkflowError::fetch(FetchFailure::Timeout, "Request timed out")
    } else {
        MarkflowError::fetch(FetchFailure::Network, format!("Failed to fetch: {}", err))
    }
}

/// CLI entry point for `markflow fetch <url>`.
pub async fn run_fetch(config: &Config, url: &str) -> Result<()> {
    let fetcher = PageFetcher::new(&config.fetch)?;
    let info = fetcher.fetch_page_info(url).await?;
    println!("Title:       {}", info.title);
    if info.description.is_empty() {
        println!("Description: (none)");
    } else {
        println!("Description: {}", info.description);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_http_schemes() {
        for raw in ["", "   ", "not a url", "ftp://example.com", "file:///etc/passwd"] {
            match parse_http_url(raw) {
                Err(MarkflowError::UpstreamFetch { kind, .. }) => {
                    assert_eq!(kind, FetchFailure::InvalidUrl, "{}", raw)
                }
                other => panic!("expected InvalidUrl for {:?}, got {:?}", raw, other),
            }
        }
    }

    #[test]
    fn test_accepts_http_and_https() {
        assert!(parse_http_url("http://example.com").is_ok());
        assert!(parse_http_url(" https://example.com/a?b=c ").is_ok());
    }
}
