//! Per-session memory of the last ranking filter.
//!
//! The ranking page records the filter it used so the "all rankings" page
//! can continue from it without the client sending it again.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use taisen_core::RankingFilter;
use tokio::sync::RwLock;

/// How long a remembered filter stays valid.
pub const DEFAULT_FILTER_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone)]
struct Entry {
    filter: RankingFilter,
    stored_at: Instant,
}

/// In-memory filter store keyed by session.
#[derive(Clone)]
pub struct RankingFilterStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
    ttl: Duration,
}

impl Default for RankingFilterStore {
    fn default() -> Self {
        Self::new(DEFAULT_FILTER_TTL)
    }
}

impl RankingFilterStore {
    /// Create a store whose entries expire after `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Remember the filter a session last used.
    pub async fn remember(&self, key: &str, filter: RankingFilter) {
        self.entries.write().await.insert(
            key.to_string(),
            Entry {
                filter,
                stored_at: Instant::now(),
            },
        );
    }

    /// The filter a session last used, if still fresh.
    pub async fn recall(&self, key: &str) -> Option<RankingFilter> {
        self.entries
            .read()
            .await
            .get(key)
            .filter(|e| e.stored_at.elapsed() < self.ttl)
            .map(|e| e.filter.clone())
    }

    /// Drop expired entries.
    pub async fn cleanup(&self) {
        let ttl = self.ttl;
        self.entries
            .write()
            .await
            .retain(|_, e| e.stored_at.elapsed() < ttl);
    }

    /// Number of remembered sessions.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether nothing is remembered.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_remember_and_recall() {
        let store = RankingFilterStore::default();
        let filter = RankingFilter {
            organization: Some("RIZIN".to_string()),
            ..Default::default()
        };

        store.remember("user:1", filter.clone()).await;

        assert_eq!(store.recall("user:1").await, Some(filter));
        assert_eq!(store.recall("user:2").await, None);
    }

    #[tokio::test]
    async fn test_expired_entries_are_ignored_and_cleaned() {
        let store = RankingFilterStore::new(Duration::ZERO);

        store.remember("session:a", RankingFilter::default()).await;

        assert_eq!(store.recall("session:a").await, None);
        store.cleanup().await;
        assert!(store.is_empty().await);
    }
}
