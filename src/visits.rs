//! Per-device visit log persisted as a JSON file at `[visits].path`.

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::Path;

use markflow_core::view::ViewQuery;
use markflow_core::visits::VisitLog;

use crate::config::Config;
use crate::service::BookmarkService;

/// Reads the log, returning an empty one if the file does not exist.
pub fn load_visit_log(path: &Path) -> Result<VisitLog> {
    if !path.exists() {
        return Ok(VisitLog::new());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read visit log: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse visit log: {}", path.display()))
}

/// Overwrites the log file. Last write wins.
pub fn save_visit_log(path: &Path, log: &VisitLog) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string(log)?)
        .with_context(|| format!("Failed to write visit log: {}", path.display()))
}

/// `markflow visit <id>`: records a visit and prints the bookmark URL.
pub async fn run_visit(config: &Config, service: &BookmarkService, id: &str) -> Result<()> {
    let bookmark = service.find_bookmark(id).await?;

    let mut log = load_visit_log(&config.visits.path)?;
    log.record(&bookmark.id, Utc::now().timestamp_millis());
    save_visit_log(&config.visits.path, &log)?;

    println!("{}", bookmark.url);
    Ok(())
}

/// `markflow frequent`: most recently visited bookmarks, newest first,
/// padded with never-visited ones.
pub async fn run_frequent(config: &Config, service: &BookmarkService) -> Result<()> {
    let log = load_visit_log(&config.visits.path)?;
    let bookmarks = service.list_bookmarks(&ViewQuery::default()).await?;
    let frequent = log.frequent(&bookmarks);

    if frequent.is_empty() {
        println!("No bookmarks.");
        return Ok(());
    }
    for b in frequent {
        let when = log
            .most_recent_visit(&b.id)
            .and_then(chrono::DateTime::from_timestamp_millis)
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());
        println!("{:<16}  {}  {}  ({})", when, b.id, b.name, b.url);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty_log() {
        let tmp = TempDir::new().unwrap();
        let log = load_visit_log(&tmp.path().join("visits.json")).unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("visits.json");

        let mut log = VisitLog::new();
        log.record("user-1-a", 10);
        log.record("user-2-b", 30);
        save_visit_log(&path, &log).unwrap();

        let loaded = load_visit_log(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.most_recent_visit("user-2-b"), Some(30));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("visits.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(load_visit_log(&path).is_err());
    }
}
