//! Full-page cache for views that look the same to every visitor.
//!
//! Entries are rendered bytes, not data. Once stored, an entry is served
//! as-is until its ttl runs out or the cache is flushed, even if the data it
//! was rendered from changed in the meantime. The cache holds at most
//! `capacity` entries and evicts the least recently used one when full.

use bytes::Bytes;
use lru::LruCache;
use std::{
    future::Future,
    num::NonZeroUsize,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub const DEFAULT_CAPACITY: NonZeroUsize = NonZeroUsize::new(128).unwrap();

#[derive(Clone, Debug)]
struct CachedPage {
    body: Bytes,
    /// `None` when the ttl reaches past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl CachedPage {
    fn is_valid_at(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|expires_at| now < expires_at)
    }
}

#[derive(Debug)]
pub struct PageCache {
    entries: RwLock<LruCache<String, CachedPage>>,
}

impl Default for PageCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl PageCache {
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
        }
    }

    /// Serves `key` from the cache, or renders and stores it for `ttl`.
    ///
    /// Render errors are passed through and leave the cache untouched. The
    /// lock is not held while rendering, so two concurrent misses both render
    /// and the later one wins.
    pub async fn get_or_render<F, Fut, E>(
        &self,
        key: String,
        ttl: Duration,
        render: F,
    ) -> Result<Bytes, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Bytes, E>>,
    {
        if let Some(body) = self.get(&key) {
            debug!(%key, outcome = "hit", "Page cache lookup");
            return Ok(body);
        }
        debug!(%key, outcome = "miss", "Page cache lookup");

        let body = render().await?;
        self.insert(key, body.clone(), ttl);

        Ok(body)
    }

    /// A still valid rendering of `key`. An expired entry is dropped on the way.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        let now = Instant::now();
        let mut entries = self.write();

        match entries
            .get(key)
            .map(|page| page.is_valid_at(now).then(|| page.body.clone()))
        {
            Some(Some(body)) => Some(body),
            Some(None) => {
                entries.pop(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: String, body: Bytes, ttl: Duration) {
        let now = Instant::now();
        let mut entries = self.write();

        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, page)| !page.is_valid_at(now))
            .map(|(expired, _)| expired.clone())
            .collect();
        for expired in &expired {
            entries.pop(expired);
        }

        let page = CachedPage {
            body,
            expires_at: now.checked_add(ttl),
        };
        let replaces = entries.contains(&key);
        if let Some((evicted, _)) = entries.push(key, page) {
            if !replaces {
                debug!(key = %evicted, "Page cache evicted entry");
            }
        }
    }

    pub fn invalidate_all(&self) {
        let mut entries = self.write();
        let flushed = entries.len();
        entries.clear();

        info!(flushed, "Page cache flushed");
    }

    /// Number of stored entries, expired ones included until they are pruned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> RwLockReadGuard<'_, LruCache<String, CachedPage>> {
        self.entries.read().unwrap_or_else(|poisoned| {
            warn!("Recovered from poisoned page cache lock");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, LruCache<String, CachedPage>> {
        self.entries.write().unwrap_or_else(|poisoned| {
            warn!("Recovered from poisoned page cache lock");
            poisoned.into_inner()
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::server::cache::PageCache;
    use bytes::Bytes;
    use std::{
        convert::Infallible,
        num::NonZeroUsize,
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    const TTL: Duration = Duration::from_secs(20);

    async fn render_counted(
        cache: &PageCache,
        renders: &AtomicUsize,
        body: &'static str,
    ) -> Bytes {
        cache
            .get_or_render("index?page=1".to_owned(), TTL, || async {
                renders.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Infallible>(Bytes::from_static(body.as_bytes()))
            })
            .await
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn serves_stale_content_until_ttl() {
        let cache = PageCache::default();
        let renders = AtomicUsize::new(0);

        assert_eq!(render_counted(&cache, &renders, "old").await, "old");

        tokio::time::advance(TTL - Duration::from_millis(1)).await;
        assert_eq!(render_counted(&cache, &renders, "new").await, "old");
        assert_eq!(renders.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(render_counted(&cache, &renders, "new").await, "new");
        assert_eq!(renders.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_all_forces_render() {
        let cache = PageCache::default();
        let renders = AtomicUsize::new(0);

        render_counted(&cache, &renders, "old").await;
        cache.invalidate_all();
        assert!(cache.is_empty());

        assert_eq!(render_counted(&cache, &renders, "new").await, "new");
        assert_eq!(renders.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_render_is_not_cached() {
        let cache = PageCache::default();

        let failed = cache
            .get_or_render("index?page=1".to_owned(), TTL, || async { Err("database down") })
            .await;
        assert_eq!(failed, Err("database down"));
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn keys_are_independent() {
        let cache = PageCache::default();
        cache.insert("index?page=1".to_owned(), Bytes::from_static(b"one"), TTL);
        cache.insert("index?page=2".to_owned(), Bytes::from_static(b"two"), TTL);

        assert_eq!(cache.get("index?page=1").unwrap(), "one");
        assert_eq!(cache.get("index?page=2").unwrap(), "two");
        assert!(cache.get("index?page=3").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entries_are_pruned() {
        let cache = PageCache::default();
        cache.insert("short".to_owned(), Bytes::from_static(b"a"), Duration::from_secs(1));
        cache.insert("long".to_owned(), Bytes::from_static(b"b"), TTL);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.len(), 2);

        assert!(cache.get("short").is_none());
        assert_eq!(cache.len(), 1);

        cache.insert("fresh".to_owned(), Bytes::from_static(b"c"), TTL);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn full_cache_evicts_least_recently_used() {
        let cache = PageCache::new(NonZeroUsize::new(2).unwrap());
        cache.insert("index?page=1".to_owned(), Bytes::from_static(b"one"), TTL);
        cache.insert("index?page=2".to_owned(), Bytes::from_static(b"two"), TTL);
        assert!(cache.get("index?page=1").is_some());

        cache.insert("index?page=3".to_owned(), Bytes::from_static(b"three"), TTL);

        assert_eq!(cache.len(), 2);
        assert!(cache.get("index?page=2").is_none());
        assert_eq!(cache.get("index?page=1").unwrap(), "one");
        assert_eq!(cache.get("index?page=3").unwrap(), "three");
    }

    #[tokio::test(start_paused = true)]
    async fn unrepresentable_ttl_never_expires() {
        let cache = PageCache::default();
        cache.insert("index?page=1".to_owned(), Bytes::from_static(b"one"), Duration::MAX);
        cache.insert(
            "index?page=2".to_owned(),
            Bytes::from_static(b"two"),
            Duration::from_secs(u64::MAX),
        );

        tokio::time::advance(Duration::from_secs(60 * 60 * 24 * 365)).await;

        assert_eq!(cache.get("index?page=1").unwrap(), "one");
        assert_eq!(cache.get("index?page=2").unwrap(), "two");
    }
}
