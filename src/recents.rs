//! Recently-seen category store backing `/l`
//!
//! Process-wide, bounded LRU: recording a category promotes it to the front,
//! and anything beyond capacity falls off the back. Only the id and title
//! are kept; absolute URLs are built per request against that request's base
//! URL.

use std::num::NonZeroUsize;

use lru::LruCache;
use tokio::sync::Mutex;

use crate::models::Category;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentEntry {
    pub id: String,
    pub title: String,
}

pub struct RecentCategories {
    entries: Mutex<LruCache<String, RecentEntry>>,
}

impl RecentCategories {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Record a successfully resolved category, promoting it to most recent
    pub async fn record(&self, category: &Category) {
        let entry = RecentEntry {
            id: category.id.clone(),
            title: category.title.clone(),
        };
        self.entries.lock().await.put(category.id.clone(), entry);
    }

    /// Snapshot, most recent first
    pub async fn list(&self) -> Vec<RecentEntry> {
        self.entries
            .lock()
            .await
            .iter()
            .map(|(_, entry)| entry.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(id: &str, title: &str) -> Category {
        Category {
            id: id.to_string(),
            title: title.to_string(),
            episodes: Vec::new(),
        }
    }

    #[tokio::test]
    async fn listing_is_most_recent_first() {
        let recents = RecentCategories::new(8);
        recents.record(&category("90", "進擊的巨人")).await;
        recents.record(&category("91", "別的")).await;
        let ids: Vec<String> = recents.list().await.into_iter().map(|e| e.id).collect();
        assert_eq!(ids, ["91", "90"]);
    }

    #[tokio::test]
    async fn re_recording_promotes_and_updates() {
        let recents = RecentCategories::new(8);
        recents.record(&category("90", "舊標題")).await;
        recents.record(&category("91", "別的")).await;
        recents.record(&category("90", "新標題")).await;
        let entries = recents.list().await;
        assert_eq!(entries[0].id, "90");
        assert_eq!(entries[0].title, "新標題");
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn capacity_is_enforced_by_eviction() {
        let recents = RecentCategories::new(2);
        recents.record(&category("1", "一")).await;
        recents.record(&category("2", "二")).await;
        recents.record(&category("3", "三")).await;
        let ids: Vec<String> = recents.list().await.into_iter().map(|e| e.id).collect();
        assert_eq!(ids, ["3", "2"]);
    }
}
