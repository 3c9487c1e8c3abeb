//! TTL cache for ranked results.
//!
//! Keys fingerprint every request field that affects ranking. Any write
//! to the corpus flushes the whole cache: popularity feeds every blended
//! score, so after a mutation no cached entry can be trusted.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use ideadb_core::types::SearchResult;

pub struct ResultCache {
    ttl: Duration,
    capacity: usize,
    entries: HashMap<String, CacheEntry>,
}

struct CacheEntry {
    stored_at: Instant,
    results: Vec<SearchResult>,
    total_found: usize,
}

impl ResultCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self { ttl, capacity, entries: HashMap::new() }
    }

    pub fn get(&self, key: &str) -> Option<(Vec<SearchResult>, usize)> {
        let entry = self.entries.get(key)?;
        if entry.stored_at.elapsed() > self.ttl {
            return None;
        }
        Some((entry.results.clone(), entry.total_found))
    }

    pub fn put(&mut self, key: String, results: Vec<SearchResult>, total_found: usize) {
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            let ttl = self.ttl;
            self.entries.retain(|_, e| e.stored_at.elapsed() <= ttl);
            // still full after dropping expired entries: drop arbitrary ones
            while self.entries.len() >= self.capacity {
                match self.entries.keys().next().cloned() {
                    Some(k) => {
                        self.entries.remove(&k);
                    }
                    None => break,
                }
            }
        }
        self.entries.insert(key, CacheEntry { stored_at: Instant::now(), results, total_found });
    }

    pub fn flush(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
