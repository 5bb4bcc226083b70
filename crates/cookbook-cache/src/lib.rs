//! Page caching for incrementally built pages.
//!
//! This crate provides:
//! - `PageCache` - Pending/Ready page states with revalidate expiry
//! - `PageCacheBackend` - Storage behind the cache, with `InMemoryBackend`
//! - `PagePolicy` - Cache-Control for built pages and placeholders
//! - `CacheKey` - Normalized page keys
//! - `PageHeaders` / `CacheExplain` - Response headers explaining cache behavior
//!
//! # Example
//!
//! ```ignore
//! use cookbook_cache::{CacheKey, CachedPage, InMemoryBackend, Lookup, PageCache};
//!
//! let cache = PageCache::new(InMemoryBackend::new());
//! let key = CacheKey::for_page("/recipes/pancakes");
//!
//! if let Lookup::Miss = cache.lookup(&key, now).await? {
//!     if cache.begin_fill(&key, now).await? {
//!         // build in the background, then:
//!         cache.complete(&key, CachedPage::new(html, true, now, revalidate)).await?;
//!     }
//! }
//! ```

mod headers;
mod key;
mod page;
mod policy;

pub use headers::*;
pub use key::*;
pub use page::*;
pub use policy::*;
