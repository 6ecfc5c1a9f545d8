//! Time-boxed value cache.
//!
//! Holds a single value with an expiry. Used for the benchmark return series
//! so repeated scans within the TTL reuse one fetch.

use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Cache entry with TTL
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    data: T,
    stored_at: Instant,
    expires_at: Instant,
}

impl<T> CacheEntry<T> {
    fn new(data: T, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            data,
            stored_at: now,
            expires_at: now + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Single-value cache with expiry.
#[derive(Debug)]
pub struct TtlCache<T> {
    entry: RwLock<Option<CacheEntry<T>>>,
    ttl: Duration,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entry: RwLock::new(None),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached value if present and not expired.
    pub fn get(&self) -> Option<T> {
        let entry = self.entry.read().ok()?;
        entry
            .as_ref()
            .filter(|e| !e.is_expired())
            .map(|e| e.data.clone())
    }

    /// Store a value, replacing any previous one.
    pub fn set(&self, data: T) {
        if let Ok(mut entry) = self.entry.write() {
            *entry = Some(CacheEntry::new(data, self.ttl));
        }
    }

    /// Drop the cached value.
    pub fn invalidate(&self) {
        if let Ok(mut entry) = self.entry.write() {
            *entry = None;
        }
    }

    pub fn stats(&self) -> CacheStats {
        let entry = self.entry.read().ok();
        match entry.as_ref().and_then(|e| e.as_ref()) {
            Some(e) => CacheStats {
                populated: true,
                expired: e.is_expired(),
                age: Some(e.stored_at.elapsed()),
            },
            None => CacheStats::default(),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub populated: bool,
    pub expired: bool,
    pub age: Option<Duration>,
}

// ============================================================================
// Tests
// ============================================================================
