//! Time-bounded record of what has already been ingested.

use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Maps `type:value` keys to an expiry instant.
///
/// Expired entries are evicted lazily when looked up; there is no sweep.
#[derive(Debug, Clone, Default)]
pub struct DedupCache {
    entries: HashMap<String, Instant>,
}

impl DedupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache key for a detection type and canonical value.
    pub fn key(detection_type: &str, value: &str) -> String {
        format!("{}:{}", detection_type, value)
    }

    /// Whether `key` holds an unexpired entry at `now`.
    pub fn contains_at(&mut self, key: &str, now: Instant) -> bool {
        match self.entries.get(key) {
            Some(expires) if *expires > now => true,
            Some(_) => {
                self.entries.remove(key);
                false
            }
            None => false,
        }
    }

    pub fn contains(&mut self, key: &str) -> bool {
        self.contains_at(key, Instant::now())
    }

    /// Insert or refresh `key` so it expires `ttl` after `now`.
    pub fn insert_at(&mut self, key: impl Into<String>, ttl: Duration, now: Instant) {
        self.entries.insert(key.into(), now + ttl);
    }

    pub fn insert(&mut self, key: impl Into<String>, ttl: Duration) {
        self.insert_at(key, ttl, Instant::now());
    }

    /// Entries held, including expired ones not yet looked up.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
