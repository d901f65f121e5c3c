//! In-process cache backed by `DashMap`, used when no Redis URL is configured.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::cache::CacheStore;
use crate::config::LOCAL_CACHE_MAX_ENTRIES;
use crate::errors::AppResult;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Shared, clonable in-memory store with per-entry TTL.
#[derive(Debug, Clone, Default)]
pub struct LocalCache {
    entries: Arc<DashMap<String, Entry>>,
}

impl LocalCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn purge_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| !entry.is_expired(now));
    }
}

/// Glob match supporting `*` only, which is all the key patterns use.
fn matches_glob(pattern: &str, key: &str) -> bool {
    let mut parts = pattern.split('*');
    let Some(first) = parts.next() else {
        return key.is_empty();
    };
    let Some(mut rest) = key.strip_prefix(first) else {
        return false;
    };

    let parts: Vec<&str> = parts.collect();
    let Some((last, middle)) = parts.split_last() else {
        return rest.is_empty();
    };

    for part in middle {
        match rest.find(part) {
            Some(pos) => rest = &rest[pos + part.len()..],
            None => return false,
        }
    }
    rest.ends_with(last)
}

#[async_trait]
impl CacheStore for LocalCache {
    async fn get_raw(&self, key: &str) -> AppResult<Option<String>> {
        let now = Instant::now();
        let hit = self.entries.get(key).map(|entry| entry.clone());

        match hit {
            Some(entry) if entry.is_expired(now) => {
                self.entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value)),
            None => Ok(None),
        }
    }

    async fn set_raw(&self, key: &str, value: String, ttl_seconds: u64) -> AppResult<()> {
        if self.entries.len() >= LOCAL_CACHE_MAX_ENTRIES {
            self.purge_expired();
        }
        if self.entries.len() >= LOCAL_CACHE_MAX_ENTRIES && !self.entries.contains_key(key) {
            tracing::warn!(key = %key, "Local cache full, skipping write");
            return Ok(());
        }

        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + Duration::from_secs(ttl_seconds),
            },
        );
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> AppResult<u64> {
        let before = self.entries.len();
        self.entries.retain(|key, _| !matches_glob(pattern, key));
        Ok(before.saturating_sub(self.entries.len()) as u64)
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
