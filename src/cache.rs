//! In-memory cache of resolved streams
//!
//! A player issues many range requests against `/v/{id}` during one
//! playback; without this cache every one of them would re-fetch the episode
//! page and re-run the resolution round trip. Entries live only until their
//! `expires_at` (derived from the upstream expiry) and the whole map is
//! bounded. Nothing here is ever persisted.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::models::ResolvedStream;

pub struct StreamCache {
    capacity: usize,
    entries: Mutex<HashMap<String, ResolvedStream>>,
}

impl StreamCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fresh cached stream for an episode, if any. Expired entries are
    /// dropped on access.
    pub async fn get(&self, episode_id: &str) -> Option<ResolvedStream> {
        let mut entries = self.entries.lock().await;
        match entries.get(episode_id) {
            Some(stream) if !stream.is_expired() => Some(stream.clone()),
            Some(_) => {
                entries.remove(episode_id);
                None
            }
            None => None,
        }
    }

    pub async fn insert(&self, stream: ResolvedStream) {
        let mut entries = self.entries.lock().await;
        entries.insert(stream.episode_id.clone(), stream);

        if entries.len() > self.capacity {
            entries.retain(|_, stream| !stream.is_expired());
        }
        // Still over capacity after shedding expired entries: drop the oldest
        // resolutions first.
        while entries.len() > self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, stream)| stream.resolved_at)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    entries.remove(&id);
                }
                None => break,
            }
        }
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}
