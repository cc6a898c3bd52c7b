//! TTL + LRU table of resolved links.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// An external link re-uploaded to the chat server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct LinkUpload {
    /// Content reference returned by the upload (e.g. `mxc://server/id`)
    content_uri: String,
    /// MIME type announced by the link's server
    mimetype: String,
    /// Bytes actually re-uploaded
    content_length: Option<u64>,
}

impl LinkUpload {
    /// Create a resolved link.
    pub fn new(
        content_uri: impl Into<String>,
        mimetype: impl Into<String>,
        content_length: Option<u64>,
    ) -> Self {
        Self {
            content_uri: content_uri.into(),
            mimetype: mimetype.into(),
            content_length,
        }
    }
}

#[derive(Debug, Clone)]
struct LinkEntry {
    upload: LinkUpload,
    created_at: Instant,
}

/// Resolved links keyed by URL.
///
/// Entries expire after `ttl`; past `capacity` the least recently used entry
/// is evicted. Owned by a single worker, so it needs no locking.
///
/// # Example
///
/// ```
/// use crosspost_cache::{LinkTable, LinkUpload};
/// use std::time::Duration;
///
/// let mut table = LinkTable::new(2, Duration::from_secs(60));
/// table.insert("https://a.example/1.png", LinkUpload::new("mxc://hs/1", "image/png", None));
/// assert!(table.get("https://a.example/1.png").is_some());
/// assert!(table.get("https://a.example/2.png").is_none());
/// ```
#[derive(Debug)]
pub struct LinkTable {
    capacity: usize,
    ttl: Duration,
    entries: HashMap<String, LinkEntry>,
    access_order: Vec<String>,
}

impl LinkTable {
    /// Create an empty table.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        tracing::debug!(capacity, ttl = ?ttl, "Creating link table");
        Self {
            capacity,
            ttl,
            entries: HashMap::new(),
            access_order: Vec::new(),
        }
    }

    /// Remember a resolved link.
    pub fn insert(&mut self, url: &str, upload: LinkUpload) {
        if self.capacity == 0 {
            return;
        }

        if self.entries.len() >= self.capacity && !self.entries.contains_key(url) {
            self.cleanup_expired();
        }
        if self.entries.len() >= self.capacity && !self.entries.contains_key(url) {
            self.evict_lru();
        }

        self.touch(url);
        self.entries.insert(
            url.to_string(),
            LinkEntry {
                upload,
                created_at: Instant::now(),
            },
        );
    }

    /// Resolved link for `url`, unless missing or expired.
    pub fn get(&mut self, url: &str) -> Option<&LinkUpload> {
        let expired = self.entries.get(url)?.created_at.elapsed() > self.ttl;
        if expired {
            tracing::debug!(url, "Link entry expired, removing");
            self.entries.remove(url);
            self.forget(url);
            return None;
        }

        self.touch(url);
        self.entries.get(url).map(|entry| &entry.upload)
    }

    /// Drop expired entries, returning how many were removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries
            .retain(|_, entry| entry.created_at.elapsed() <= ttl);
        let entries = &self.entries;
        self.access_order.retain(|url| entries.contains_key(url));

        let removed = before - self.entries.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = self.entries.len(), "Dropped expired links");
        }
        removed
    }

    /// Number of cached links.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no link is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn touch(&mut self, url: &str) {
        self.forget(url);
        self.access_order.push(url.to_string());
    }

    fn forget(&mut self, url: &str) {
        if let Some(pos) = self.access_order.iter().position(|k| k == url) {
            self.access_order.remove(pos);
        }
    }

    fn evict_lru(&mut self) {
        if !self.access_order.is_empty() {
            let url = self.access_order.remove(0);
            tracing::debug!(url = %url, "Evicting least recently used link");
            self.entries.remove(&url);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(n: u32) -> LinkUpload {
        LinkUpload::new(format!("mxc://hs/{}", n), "image/png", Some(n as u64))
    }

    #[test]
    fn evicts_least_recently_used() {
        let mut table = LinkTable::new(2, Duration::from_secs(60));
        table.insert("a", upload(1));
        table.insert("b", upload(2));
        // Touch "a" so "b" becomes the eviction candidate.
        assert!(table.get("a").is_some());
        table.insert("c", upload(3));

        assert_eq!(table.len(), 2);
        assert!(table.get("a").is_some());
        assert!(table.get("b").is_none());
        assert!(table.get("c").is_some());
    }

    #[test]
    fn replacing_does_not_evict() {
        let mut table = LinkTable::new(2, Duration::from_secs(60));
        table.insert("a", upload(1));
        table.insert("b", upload(2));
        table.insert("a", upload(3));

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("a").unwrap().content_uri(), "mxc://hs/3");
    }

    #[test]
    fn expired_entries_are_misses() {
        let mut table = LinkTable::new(4, Duration::from_millis(10));
        table.insert("a", upload(1));
        std::thread::sleep(Duration::from_millis(30));

        assert!(table.get("a").is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn zero_capacity_caches_nothing() {
        let mut table = LinkTable::new(0, Duration::from_secs(60));
        table.insert("a", upload(1));
        assert!(table.is_empty());
    }
}
