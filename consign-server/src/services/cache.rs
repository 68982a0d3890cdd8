//! Cache collaborator
//!
//! Key/value cache used as a read-through layer over the document
//! store. The store remains the single source of truth: everything in
//! here is a disposable projection and the system must stay correct
//! with the cache absent.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(String),
}

/// Cache capability injected into services (never a process-wide
/// singleton).
#[async_trait]
pub trait Cache: Send + Sync {
    /// Fetch a value; `None` on miss or expiry
    async fn get(&self, key: &str) -> Option<String>;

    /// Store a value with a time-to-live
    async fn set_with_ttl(&self, key: &str, value: String, ttl_secs: u64)
    -> Result<(), CacheError>;

    /// Remove a set of keys; missing keys are not an error
    async fn delete(&self, keys: &[String]) -> Result<(), CacheError>;

    /// Increment a counter, creating it with the given TTL.
    /// Used only by the rate-limit middleware, never by the core.
    async fn increment(&self, key: &str, ttl_secs: u64) -> Result<i64, CacheError>;
}

struct Entry {
    value: String,
    expires_at: Instant,
}

struct Counter {
    count: i64,
    expires_at: Instant,
}

/// In-process cache: DashMap with lazy expiry
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<String, Entry>,
    counters: DashMap<String, Counter>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: String,
        ttl_secs: u64,
    ) -> Result<(), CacheError> {
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + Duration::from_secs(ttl_secs),
            },
        );
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<(), CacheError> {
        for key in keys {
            self.entries.remove(key);
        }
        Ok(())
    }

    async fn increment(&self, key: &str, ttl_secs: u64) -> Result<i64, CacheError> {
        let now = Instant::now();
        let mut counter = self.counters.entry(key.to_string()).or_insert(Counter {
            count: 0,
            expires_at: now + Duration::from_secs(ttl_secs),
        });
        if counter.expires_at <= now {
            // Window elapsed, start a fresh one
            counter.count = 0;
            counter.expires_at = now + Duration::from_secs(ttl_secs);
        }
        counter.count += 1;
        Ok(counter.count)
    }
}
