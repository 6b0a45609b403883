//! Export the bookmark list as JSON.
//!
//! Produces the same `{bookmarks, exportedAt}` document the
//! `GET /api/bookmarks/export` route serves.

use anyhow::Result;
use std::path::Path;

use crate::service::BookmarkService;

/// If `output` is `Some`, writes to that file path. Otherwise writes
/// to stdout for piping.
pub async fn run_export(service: &BookmarkService, output: Option<&Path>) -> Result<()> {
    let export = service.export().await?;
    let count = export.bookmarks.len();
    let json = serde_json::to_string_pretty(&export)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &json)?;
            eprintln!("Exported {} bookmarks to {}", count, path.display());
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}
