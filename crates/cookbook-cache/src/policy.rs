//! How long downstream caches may keep a built page.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::page::CachedPage;

const NO_STORE: &str = "no-store";

/// Who may keep a copy of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheScope {
    /// Browsers and shared caches (CDN).
    Public,
    /// Browsers only.
    Private,
    #[default]
    None,
}

impl CacheScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::None => "none",
        }
    }
}

/// Downstream caching of built pages.
///
/// `max_age` matches the page's revalidate interval, so a browser or CDN
/// asks again about when the page cache would regenerate it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PagePolicy {
    pub scope: CacheScope,
    pub max_age: Duration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stale_while_revalidate: Option<Duration>,
}

impl PagePolicy {
    /// Nothing downstream may keep the page.
    pub fn no_store() -> Self {
        Self::default()
    }

    /// Cacheable by browsers and shared caches for `max_age`.
    pub fn shared(max_age: Duration) -> Self {
        Self {
            scope: CacheScope::Public,
            max_age,
            stale_while_revalidate: None,
        }
    }

    /// Cacheable by browsers only for `max_age`.
    pub fn private(max_age: Duration) -> Self {
        Self {
            scope: CacheScope::Private,
            max_age,
            stale_while_revalidate: None,
        }
    }

    /// Let caches serve a stale copy for `window` while they refetch.
    pub fn with_stale_while_revalidate(mut self, window: Duration) -> Self {
        self.stale_while_revalidate = Some(window);
        self
    }

    /// `Cache-Control` value for a recipe page.
    pub fn cache_control(&self) -> String {
        if self.scope == CacheScope::None {
            return NO_STORE.to_string();
        }

        let mut value = format!("{}, max-age={}", self.scope.as_str(), self.max_age.as_secs());
        if let Some(window) = self.stale_while_revalidate {
            value.push_str(&format!(", stale-while-revalidate={}", window.as_secs()));
        }
        value
    }

    /// `Cache-Control` value for `page`. A placeholder stored for a
    /// missing recipe is never cacheable downstream.
    pub fn cache_control_for(&self, page: &CachedPage) -> String {
        if page.found {
            self.cache_control()
        } else {
            NO_STORE.to_string()
        }
    }
}
