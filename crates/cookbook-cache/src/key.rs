//! Cache key composition.

use serde::{Deserialize, Serialize};

/// A cache key uniquely identifying a cached page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    key: String,
}

impl CacheKey {
    /// Create a cache key from a string.
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Key for the canonical path of a page.
    ///
    /// The path is used as given: callers build it from decoded route
    /// parameters, so `/recipes/a%3Fb` and `/recipes/a` stay distinct.
    pub fn for_page(path: &str) -> Self {
        Self::new(format!("page:{}", path))
    }

    /// Get the key string.
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Key of the fill lock for this page.
    pub fn fill_lock(&self) -> String {
        format!("fill:{}", self.key)
    }

    /// Key of the revalidation lock for this page.
    pub fn revalidate_lock(&self) -> String {
        format!("revalidate:{}", self.key)
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key)
    }
}
