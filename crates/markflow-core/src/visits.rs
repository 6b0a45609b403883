//! Device-scoped visit log and the "frequent" ranking built on it.
//!
//! One [`VisitLog`] exists per device (the CLI keeps it in a JSON file).
//! Writers on different devices are never reconciled; concurrent writers
//! on the same device are last-write-wins.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::Bookmark;

/// How many bookmarks the frequent view shows.
pub const FREQUENT_LIMIT: usize = 6;

/// Oldest events are dropped once the log grows past this.
pub const MAX_VISITS: usize = 200;

/// A single visit: bookmark id and epoch-millis timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    pub id: String,
    pub at: i64,
}

/// Append-only log of visit events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitLog {
    visits: Vec<Visit>,
}

impl VisitLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a visit, dropping the oldest events beyond [`MAX_VISITS`].
    pub fn record(&mut self, id: &str, at: i64) {
        self.visits.push(Visit {
            id: id.to_string(),
            at,
        });
        if self.visits.len() > MAX_VISITS {
            let excess = self.visits.len() - MAX_VISITS;
            self.visits.drain(..excess);
        }
    }

    /// Latest recorded visit to `id`, if any.
    pub fn most_recent_visit(&self, id: &str) -> Option<i64> {
        self.visits
            .iter()
            .filter(|v| v.id == id)
            .map(|v| v.at)
            .max()
    }

    pub fn len(&self) -> usize {
        self.visits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }

    /// Most-recent visit per bookmark id.
    fn latest_by_id(&self) -> HashMap<&str, i64> {
        let mut latest: HashMap<&str, i64> = HashMap::new();
        for v in &self.visits {
            let entry = latest.entry(v.id.as_str()).or_insert(v.at);
            if v.at > *entry {
                *entry = v.at;
            }
        }
        latest
    }

    /// Bookmarks ranked by most recent visit, newest first, capped at
    /// [`FREQUENT_LIMIT`]. Never-visited bookmarks sort last in input order.
    pub fn frequent(&self, bookmarks: &[Bookmark]) -> Vec<Bookmark> {
        let latest = self.latest_by_id();
        let mut ranked: Vec<(Option<i64>, &Bookmark)> = bookmarks
            .iter()
            .map(|b| (latest.get(b.id.as_str()).copied(), b))
            .collect();
        // `None < Some(_)`, so reversing puts unvisited entries last; the
        // sort is stable so they keep their input order.
        ranked.sort_by_key(|(at, _)| std::cmp::Reverse(*at));
        ranked
            .into_iter()
            .take(FREQUENT_LIMIT)
            .map(|(_, b)| b.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bookmark(id: &str) -> Bookmark {
        Bookmark {
            id: id.to_string(),
            url: format!("https://{}.dev", id),
            name: id.to_string(),
            description: String::new(),
            category: String::new(),
            category_slug: "other".to_string(),
            favicon_domain: format!("{}.dev", id),
            logo_url: None,
            rating: 0.0,
        }
    }

    #[test]
    fn test_frequent_ranks_by_latest_visit() {
        let mut log = VisitLog::new();
        log.record("A", 10);
        log.record("B", 30);
        let ranked = log.frequent(&[bookmark("A"), bookmark("B"), bookmark("C")]);
        let ids: Vec<&str> = ranked.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_unvisited_fill_remaining_slots() {
        let mut log = VisitLog::new();
        log.record("D", 10);
        let all: Vec<Bookmark> = ["A", "B", "C", "D"].iter().map(|id| bookmark(id)).collect();
        let ids: Vec<String> = log.frequent(&all).into_iter().map(|b| b.id).collect();
        assert_eq!(ids, vec!["D", "A", "B", "C"]);

        let many: Vec<Bookmark> = (0..8).map(|i| bookmark(&format!("n{}", i))).collect();
        let ids: Vec<String> = VisitLog::new()
            .frequent(&many)
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(ids, vec!["n0", "n1", "n2", "n3", "n4", "n5"]);
    }

    #[test]
    fn test_most_recent_visit() {
        let mut log = VisitLog::new();
        assert_eq!(log.most_recent_visit("A"), None);
        log.record("A", 50);
        log.record("A", 20);
        assert_eq!(log.most_recent_visit("A"), Some(50));
    }

    #[test]
    fn test_frequent_top_six() {
        let mut log = VisitLog::new();
        let bookmarks: Vec<Bookmark> = (0..10).map(|i| bookmark(&format!("b{}", i))).collect();
        for (i, b) in bookmarks.iter().enumerate() {
            log.record(&b.id, i as i64);
        }
        let ranked = log.frequent(&bookmarks);
        assert_eq!(ranked.len(), 6);
        assert_eq!(ranked[0].id, "b9");
        assert_eq!(ranked[5].id, "b4");
    }

    #[test]
    fn test_visits_for_deleted_bookmarks_ignored() {
        let mut log = VisitLog::new();
        log.record("gone", 100);
        log.record("A", 1);
        let ranked = log.frequent(&[bookmark("A")]);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].id, "A");
    }

    #[test]
    fn test_log_is_capped() {
        let mut log = VisitLog::new();
        for i in 0..(MAX_VISITS + 25) {
            log.record("A", i as i64);
        }
        assert_eq!(log.len(), MAX_VISITS);
        assert_eq!(log.most_recent_visit("A"), Some((MAX_VISITS + 24) as i64));
    }

    #[test]
    fn test_serde_roundtrip_shape() {
        let mut log = VisitLog::new();
        log.record("A", 7);
        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json, serde_json::json!({"visits": [{"id": "A", "at": 7}]}));
    }
}
