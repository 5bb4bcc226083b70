//! Page cache with pending fills and revalidation.
//!
//! A page is either `Pending` (a build is running and no output exists yet)
//! or `Ready` (built HTML with the time it was built and its revalidate
//! interval). At most one build fills a missing page and at most one
//! regeneration runs for a stale page; both are guarded by backend locks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::headers::generate_etag;
use crate::key::CacheKey;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache operation errors.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Failed to serialize/deserialize cache entry.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Backend storage error.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Status of a cache lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    /// Fresh cache hit.
    Hit,
    /// Cache miss.
    Miss,
    /// Stale hit (serving while revalidating).
    Stale,
    /// Page is being built; placeholder served.
    Pending,
    /// Bypass - caching disabled.
    Bypass,
    /// Error during cache operation.
    Error,
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hit => write!(f, "HIT"),
            Self::Miss => write!(f, "MISS"),
            Self::Stale => write!(f, "STALE"),
            Self::Pending => write!(f, "PENDING"),
            Self::Bypass => write!(f, "BYPASS"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// A built page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedPage {
    /// Rendered HTML document.
    pub html: String,
    /// Whether the page shows real content (false for a not-found placeholder).
    pub found: bool,
    /// When the page was built.
    pub built_at: DateTime<Utc>,
    /// Seconds after `built_at` at which the page becomes stale.
    pub revalidate_secs: u64,
    /// ETag of `html`.
    pub etag: String,
}

impl CachedPage {
    /// Create a page built at `built_at`. Sub-second `revalidate`
    /// intervals count as one second.
    pub fn new(
        html: impl Into<String>,
        found: bool,
        built_at: DateTime<Utc>,
        revalidate: Duration,
    ) -> Self {
        let html = html.into();
        let etag = generate_etag(&html);
        Self {
            html,
            found,
            built_at,
            revalidate_secs: revalidate.as_secs().max(1),
            etag,
        }
    }

    /// Time at which the page becomes stale.
    pub fn expires_at(&self) -> DateTime<Utc> {
        let secs = i64::try_from(self.revalidate_secs).unwrap_or(i64::MAX);
        chrono::Duration::try_seconds(secs)
            .and_then(|ttl| self.built_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Check if the page needs regeneration.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }

    /// Age of the page.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.built_at).to_std().unwrap_or_default()
    }

    /// Time until the page becomes stale.
    pub fn remaining_ttl(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at() - now).to_std().unwrap_or_default()
    }
}

/// Stored state of a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum PageState {
    /// A first build is running.
    Pending { since: DateTime<Utc> },
    /// Built output is available.
    Ready(CachedPage),
}

/// Outcome of a page lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Built and within its revalidate interval.
    Fresh(CachedPage),
    /// Built but past its revalidate interval.
    Stale(CachedPage),
    /// A first build is running.
    Pending,
    /// Nothing cached.
    Miss,
}

impl Lookup {
    /// Cache status reported for this lookup.
    pub fn status(&self) -> CacheStatus {
        match self {
            Lookup::Fresh(_) => CacheStatus::Hit,
            Lookup::Stale(_) => CacheStatus::Stale,
            Lookup::Pending => CacheStatus::Pending,
            Lookup::Miss => CacheStatus::Miss,
        }
    }

    /// The cached page, if built.
    pub fn page(&self) -> Option<&CachedPage> {
        match self {
            Lookup::Fresh(page) | Lookup::Stale(page) => Some(page),
            Lookup::Pending | Lookup::Miss => None,
        }
    }
}

/// Page cache backend trait.
#[async_trait]
pub trait PageCacheBackend: Send + Sync {
    /// Get a page state.
    async fn get(&self, key: &str) -> CacheResult<Option<PageState>>;

    /// Store a page state.
    async fn set(&self, key: &str, state: PageState) -> CacheResult<()>;

    /// Delete a page state. Returns whether one existed.
    async fn delete(&self, key: &str) -> CacheResult<bool>;

    /// Try to acquire a lock held until `unlock` or until `ttl` after `now`.
    async fn try_lock(&self, key: &str, ttl: Duration, now: DateTime<Utc>) -> CacheResult<bool>;

    /// Release a lock.
    async fn unlock(&self, key: &str) -> CacheResult<()>;
}

/// In-process page cache backend.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    pages: Mutex<HashMap<String, PageState>>,
    locks: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl InMemoryBackend {
    /// Create a new in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored pages (pending or ready).
    pub fn len(&self) -> usize {
        self.pages.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PageCacheBackend for InMemoryBackend {
    async fn get(&self, key: &str) -> CacheResult<Option<PageState>> {
        let pages = self.pages.lock().unwrap_or_else(|e| e.into_inner());
        Ok(pages.get(key).cloned())
    }

    async fn set(&self, key: &str, state: PageState) -> CacheResult<()> {
        let mut pages = self.pages.lock().unwrap_or_else(|e| e.into_inner());
        pages.insert(key.to_string(), state);
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        let mut pages = self.pages.lock().unwrap_or_else(|e| e.into_inner());
        Ok(pages.remove(key).is_some())
    }

    async fn try_lock(&self, key: &str, ttl: Duration, now: DateTime<Utc>) -> CacheResult<bool> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(expires_at) = locks.get(key) {
            if *expires_at > now {
                return Ok(false);
            }
        }
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| CacheError::Storage(format!("lock ttl out of range: {}", e)))?;
        locks.insert(key.to_string(), now + ttl);
        Ok(true)
    }

    async fn unlock(&self, key: &str) -> CacheResult<()> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.remove(key);
        Ok(())
    }
}

/// Page cache with single-fill and single-regeneration guarantees.
pub struct PageCache<B: PageCacheBackend = InMemoryBackend> {
    backend: Arc<B>,
    /// How long a pending fill may run before another caller may retry it.
    pending_timeout: Duration,
    /// Lock TTL for regeneration.
    lock_ttl: Duration,
}

impl<B: PageCacheBackend> PageCache<B> {
    /// Create a new page cache.
    pub fn new(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
            pending_timeout: Duration::from_secs(30),
            lock_ttl: Duration::from_secs(30),
        }
    }

    /// Set the pending fill timeout.
    pub fn with_pending_timeout(mut self, duration: Duration) -> Self {
        self.pending_timeout = duration;
        self
    }

    /// Set the regeneration lock TTL.
    pub fn with_lock_ttl(mut self, duration: Duration) -> Self {
        self.lock_ttl = duration;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn pending_expired(&self, since: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        (now - since)
            .to_std()
            .map(|elapsed| elapsed >= self.pending_timeout)
            .unwrap_or(false)
    }

    /// Look up a page.
    ///
    /// A pending fill older than the pending timeout is reported as a miss
    /// so that a new fill can start.
    pub async fn lookup(&self, key: &CacheKey, now: DateTime<Utc>) -> CacheResult<Lookup> {
        let lookup = match self.backend.get(key.as_str()).await? {
            None => Lookup::Miss,
            Some(PageState::Pending { since }) => {
                if self.pending_expired(since, now) {
                    warn!(key = %key, since = %since, "pending page fill timed out");
                    Lookup::Miss
                } else {
                    Lookup::Pending
                }
            }
            Some(PageState::Ready(page)) => {
                if page.is_stale(now) {
                    Lookup::Stale(page)
                } else {
                    Lookup::Fresh(page)
                }
            }
        };
        Ok(lookup)
    }

    /// Mark a missing page as pending.
    ///
    /// Returns `true` if the caller now owns the fill and must finish it
    /// with `complete` or `abandon`; `false` if another fill is running or
    /// the page already exists.
    pub async fn begin_fill(&self, key: &CacheKey, now: DateTime<Utc>) -> CacheResult<bool> {
        let lock_key = key.fill_lock();
        if !self.backend.try_lock(&lock_key, self.pending_timeout, now).await? {
            return Ok(false);
        }

        let claimable = match self.backend.get(key.as_str()).await? {
            None => true,
            Some(PageState::Pending { since }) => self.pending_expired(since, now),
            Some(PageState::Ready(_)) => false,
        };
        if !claimable {
            self.backend.unlock(&lock_key).await?;
            return Ok(false);
        }

        self.backend.set(key.as_str(), PageState::Pending { since: now }).await?;
        debug!(key = %key, "page fill started");
        Ok(true)
    }

    /// Store a built page and release any fill or regeneration lock.
    pub async fn complete(&self, key: &CacheKey, page: CachedPage) -> CacheResult<()> {
        self.backend.set(key.as_str(), PageState::Ready(page)).await?;
        self.backend.unlock(&key.fill_lock()).await?;
        self.backend.unlock(&key.revalidate_lock()).await?;
        debug!(key = %key, "page stored");
        Ok(())
    }

    /// Give up a fill. A pending state is removed so the next request
    /// retries; a ready page is left untouched.
    pub async fn abandon(&self, key: &CacheKey) -> CacheResult<()> {
        if let Some(PageState::Pending { .. }) = self.backend.get(key.as_str()).await? {
            self.backend.delete(key.as_str()).await?;
        }
        self.backend.unlock(&key.fill_lock()).await?;
        debug!(key = %key, "page fill abandoned");
        Ok(())
    }

    /// Drop whatever is stored for a page and release its fill and
    /// regeneration locks. Used when a build finds nothing worth keeping.
    pub async fn discard(&self, key: &CacheKey) -> CacheResult<()> {
        self.backend.delete(key.as_str()).await?;
        self.backend.unlock(&key.fill_lock()).await?;
        self.backend.unlock(&key.revalidate_lock()).await?;
        debug!(key = %key, "page discarded");
        Ok(())
    }

    /// Claim regeneration of a stale page.
    pub async fn try_begin_revalidate(&self, key: &CacheKey, now: DateTime<Utc>) -> CacheResult<bool> {
        self.backend
            .try_lock(&key.revalidate_lock(), self.lock_ttl, now)
            .await
    }

    /// Release a regeneration claim without storing a page.
    pub async fn end_revalidate(&self, key: &CacheKey) -> CacheResult<()> {
        self.backend.unlock(&key.revalidate_lock()).await
    }

    /// Remove a page. Returns whether one existed.
    pub async fn invalidate(&self, key: &CacheKey) -> CacheResult<bool> {
        self.backend.delete(key.as_str()).await
    }
}

impl Default for PageCache<InMemoryBackend> {
    fn default() -> Self {
        Self::new(InMemoryBackend::new())
    }
}

impl<B: PageCacheBackend> Clone for PageCache<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            pending_timeout: self.pending_timeout,
            lock_ttl: self.lock_ttl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn secs(n: i64) -> chrono::Duration {
        chrono::Duration::seconds(n)
    }

    fn page(html: &str, built_at: DateTime<Utc>) -> CachedPage {
        CachedPage::new(html, true, built_at, Duration::from_secs(1))
    }

    fn key() -> CacheKey {
        CacheKey::for_page("/recipes/pancakes")
    }

    // === CachedPage Tests ===

    #[test]
    fn test_cached_page_staleness() {
        let page = CachedPage::new("<p>x</p>", true, t0(), Duration::from_secs(10));

        assert!(!page.is_stale(t0()));
        assert!(!page.is_stale(t0() + secs(9)));
        assert!(page.is_stale(t0() + secs(10)));
        assert_eq!(page.age(t0() + secs(4)), Duration::from_secs(4));
        assert_eq!(page.remaining_ttl(t0() + secs(4)), Duration::from_secs(6));
        assert_eq!(page.remaining_ttl(t0() + secs(40)), Duration::ZERO);
    }

    #[test]
    fn test_cached_page_sub_second_revalidate() {
        let page = CachedPage::new("<p>x</p>", true, t0(), Duration::from_millis(200));

        assert_eq!(page.revalidate_secs, 1);
        assert!(!page.is_stale(t0()));
        assert!(page.is_stale(t0() + secs(1)));
    }

    #[test]
    fn test_cached_page_etag_tracks_html() {
        let a = CachedPage::new("<p>a</p>", true, t0(), Duration::from_secs(1));
        let b = CachedPage::new("<p>b</p>", true, t0(), Duration::from_secs(1));
        assert_ne!(a.etag, b.etag);
        assert_eq!(a.etag, generate_etag("<p>a</p>"));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(CacheStatus::Pending.to_string(), "PENDING");
        assert_eq!(Lookup::Miss.status(), CacheStatus::Miss);
    }

    // === Lookup Tests ===

    #[tokio::test]
    async fn test_lookup_miss_then_fresh_then_stale() {
        let cache = PageCache::new(InMemoryBackend::new());
        assert_eq!(cache.lookup(&key(), t0()).await.unwrap(), Lookup::Miss);

        cache.complete(&key(), page("<p>v1</p>", t0())).await.unwrap();

        let fresh = cache.lookup(&key(), t0()).await.unwrap();
        assert_eq!(fresh.status(), CacheStatus::Hit);

        let stale = cache.lookup(&key(), t0() + secs(1)).await.unwrap();
        assert_eq!(stale.status(), CacheStatus::Stale);
        assert_eq!(stale.page().unwrap().html, "<p>v1</p>");
    }

    // === Fill Tests ===

    #[tokio::test]
    async fn test_begin_fill_is_exclusive() {
        let cache = PageCache::new(InMemoryBackend::new());

        assert!(cache.begin_fill(&key(), t0()).await.unwrap());
        assert!(!cache.begin_fill(&key(), t0()).await.unwrap());
        assert_eq!(cache.lookup(&key(), t0()).await.unwrap(), Lookup::Pending);
    }

    #[tokio::test]
    async fn test_complete_replaces_pending() {
        let cache = PageCache::new(InMemoryBackend::new());
        assert!(cache.begin_fill(&key(), t0()).await.unwrap());

        cache.complete(&key(), page("<p>done</p>", t0())).await.unwrap();

        let lookup = cache.lookup(&key(), t0()).await.unwrap();
        assert_eq!(lookup.page().unwrap().html, "<p>done</p>");
        assert!(!cache.begin_fill(&key(), t0()).await.unwrap());
    }

    #[tokio::test]
    async fn test_abandon_allows_retry() {
        let cache = PageCache::new(InMemoryBackend::new());
        assert!(cache.begin_fill(&key(), t0()).await.unwrap());

        cache.abandon(&key()).await.unwrap();

        assert_eq!(cache.lookup(&key(), t0()).await.unwrap(), Lookup::Miss);
        assert!(cache.begin_fill(&key(), t0()).await.unwrap());
    }

    #[tokio::test]
    async fn test_abandon_keeps_ready_page() {
        let cache = PageCache::new(InMemoryBackend::new());
        cache.complete(&key(), page("<p>v1</p>", t0())).await.unwrap();

        cache.abandon(&key()).await.unwrap();

        assert!(cache.lookup(&key(), t0()).await.unwrap().page().is_some());
    }

    #[tokio::test]
    async fn test_discard_releases_fill() {
        let cache = PageCache::new(InMemoryBackend::new());
        assert!(cache.begin_fill(&key(), t0()).await.unwrap());

        cache.discard(&key()).await.unwrap();

        assert!(cache.backend().is_empty());
        assert!(cache.begin_fill(&key(), t0()).await.unwrap());
    }

    #[tokio::test]
    async fn test_discard_drops_ready_page_and_revalidation() {
        let cache = PageCache::new(InMemoryBackend::new());
        cache.complete(&key(), page("<p>v1</p>", t0())).await.unwrap();
        let later = t0() + secs(2);
        assert!(cache.try_begin_revalidate(&key(), later).await.unwrap());

        cache.discard(&key()).await.unwrap();

        assert_eq!(cache.lookup(&key(), later).await.unwrap(), Lookup::Miss);
        assert!(cache.try_begin_revalidate(&key(), later).await.unwrap());
    }

    #[tokio::test]
    async fn test_pending_fill_times_out() {
        let cache = PageCache::new(InMemoryBackend::new())
            .with_pending_timeout(Duration::from_secs(5));
        assert!(cache.begin_fill(&key(), t0()).await.unwrap());

        assert_eq!(cache.lookup(&key(), t0() + secs(4)).await.unwrap(), Lookup::Pending);
        assert_eq!(cache.lookup(&key(), t0() + secs(5)).await.unwrap(), Lookup::Miss);
        assert!(cache.begin_fill(&key(), t0() + secs(5)).await.unwrap());
    }

    // === Revalidation Tests ===

    #[tokio::test]
    async fn test_single_revalidation() {
        let cache = PageCache::new(InMemoryBackend::new());
        cache.complete(&key(), page("<p>v1</p>", t0())).await.unwrap();
        let later = t0() + secs(2);

        assert!(cache.try_begin_revalidate(&key(), later).await.unwrap());
        assert!(!cache.try_begin_revalidate(&key(), later).await.unwrap());

        cache.complete(&key(), page("<p>v2</p>", later)).await.unwrap();

        assert!(cache.try_begin_revalidate(&key(), later).await.unwrap());
        cache.end_revalidate(&key()).await.unwrap();
        assert!(cache.try_begin_revalidate(&key(), later).await.unwrap());
    }

    #[tokio::test]
    async fn test_revalidate_lock_expires() {
        let cache = PageCache::new(InMemoryBackend::new())
            .with_lock_ttl(Duration::from_secs(10));

        assert!(cache.try_begin_revalidate(&key(), t0()).await.unwrap());
        assert!(!cache.try_begin_revalidate(&key(), t0() + secs(9)).await.unwrap());
        assert!(cache.try_begin_revalidate(&key(), t0() + secs(10)).await.unwrap());
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache = PageCache::new(InMemoryBackend::new());
        cache.complete(&key(), page("<p>v1</p>", t0())).await.unwrap();

        assert!(cache.invalidate(&key()).await.unwrap());
        assert!(!cache.invalidate(&key()).await.unwrap());
        assert_eq!(cache.lookup(&key(), t0()).await.unwrap(), Lookup::Miss);
    }

    #[tokio::test]
    async fn test_clones_share_backend() {
        let cache = PageCache::new(InMemoryBackend::new());
        let other = cache.clone();

        cache.complete(&key(), page("<p>v1</p>", t0())).await.unwrap();

        assert_eq!(other.backend().len(), 1);
    }
}
