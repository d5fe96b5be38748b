//! In-memory cache store.
//!
//! ```text
//! CacheStorage
//!     └── Cache (by name, creation order)
//!             └── URL → Response
//! ```

use hashbrown::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::Response;

/// A cached response.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Request URL.
    pub url: String,

    /// Stored response.
    pub response: Response,

    /// Cached at timestamp (ms since epoch).
    pub cached_at: u64,
}

/// A named cache.
#[derive(Debug, Default)]
pub struct Cache {
    /// Cache name.
    pub name: String,

    entries: HashMap<String, CacheEntry>,
}

impl Cache {
    /// Create an empty cache.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: HashMap::new(),
        }
    }

    /// Match a request URL exactly.
    pub fn match_url(&self, url: &str) -> Option<&CacheEntry> {
        self.entries.get(url)
    }

    /// Store a response.
    pub fn put(&mut self, url: &str, response: Response) {
        let entry = CacheEntry {
            url: url.to_string(),
            response,
            cached_at: now_millis(),
        };
        self.entries.insert(url.to_string(), entry);
    }

    /// Delete an entry.
    pub fn delete(&mut self, url: &str) -> bool {
        self.entries.remove(url).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All named caches for one origin. Lookups search caches in creation order.
#[derive(Debug, Default)]
pub struct CacheStorage {
    caches: Vec<Cache>,
}

impl CacheStorage {
    /// Create empty cache storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a cache, creating it if it doesn't exist.
    pub fn open(&mut self, name: &str) -> &mut Cache {
        let index = match self.caches.iter().position(|c| c.name == name) {
            Some(index) => index,
            None => {
                self.caches.push(Cache::new(name));
                self.caches.len() - 1
            }
        };
        &mut self.caches[index]
    }

    /// Check if a cache exists.
    pub fn has(&self, name: &str) -> bool {
        self.caches.iter().any(|c| c.name == name)
    }

    /// Delete a cache.
    pub fn delete(&mut self, name: &str) -> bool {
        let before = self.caches.len();
        self.caches.retain(|c| c.name != name);
        self.caches.len() != before
    }

    /// Cache names in creation order.
    pub fn keys(&self) -> Vec<String> {
        self.caches.iter().map(|c| c.name.clone()).collect()
    }

    /// Match a URL across all caches. The first cache holding it wins.
    pub fn match_url(&self, url: &str) -> Option<&CacheEntry> {
        self.caches.iter().find_map(|c| c.match_url(url))
    }

    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
