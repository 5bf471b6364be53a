//! Short-TTL query cache for absorbing duplicate queries in a
//! conversational burst

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

use crate::types::RetrievedContext;

/// Cached context with bookkeeping
#[derive(Debug, Clone)]
struct CacheEntry {
    value: RetrievedContext,
    cached_at: DateTime<Utc>,
    hit_count: u32,
}

/// Query cache keyed by normalized query text
///
/// Entries expire after a short TTL; the map is pruned opportunistically
/// once it grows past its size ceiling.
pub struct ContextCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl_seconds: u64,
    max_entries: usize,
}

impl ContextCache {
    /// Create a cache with the given TTL and size ceiling
    pub fn new(ttl_seconds: u64, max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl_seconds,
            max_entries,
        }
    }

    /// Hash a normalized query for the cache key
    fn cache_key(query: &str) -> String {
        let normalized = query.trim().to_lowercase();
        let mut hasher = Sha256::new();
        hasher.update(normalized.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Get a cached context if present and fresh
    pub fn get(&self, query: &str) -> Option<RetrievedContext> {
        let key = Self::cache_key(query);
        let mut entries = self.entries.write();

        if let Some(entry) = entries.get_mut(&key) {
            let age = Utc::now().signed_duration_since(entry.cached_at);
            if age.num_seconds() < 0 || age.num_seconds() as u64 > self.ttl_seconds {
                tracing::debug!("Context cache miss (expired): {}", &key[..12]);
                entries.remove(&key);
                return None;
            }
            entry.hit_count += 1;
            tracing::debug!("Context cache hit: {} (hits: {})", &key[..12], entry.hit_count);
            return Some(entry.value.clone());
        }
        None
    }

    /// Store a context, pruning expired entries once over the ceiling
    pub fn put(&self, query: &str, value: RetrievedContext) {
        let key = Self::cache_key(query);
        let mut entries = self.entries.write();

        if entries.len() >= self.max_entries {
            let now = Utc::now();
            let ttl = self.ttl_seconds as i64;
            entries.retain(|_, e| now.signed_duration_since(e.cached_at).num_seconds() <= ttl);
            // Still full of fresh entries: drop the oldest
            if entries.len() >= self.max_entries {
                if let Some(oldest) = entries
                    .iter()
                    .min_by_key(|(_, e)| e.cached_at)
                    .map(|(k, _)| k.clone())
                {
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(
            key,
            CacheEntry {
                value,
                cached_at: Utc::now(),
                hit_count: 0,
            },
        );
    }

    /// Clear all entries
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Cache statistics
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read();
        CacheStats {
            entries: entries.len(),
            total_hits: entries.values().map(|e| e.hit_count).sum(),
            max_entries: self.max_entries,
            ttl_seconds: self.ttl_seconds,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub total_hits: u32,
    pub max_entries: usize,
    pub ttl_seconds: u64,
}
