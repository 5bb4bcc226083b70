//! Response headers for served pages.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::key::CacheKey;
use crate::page::{CacheStatus, CachedPage};
use crate::policy::PagePolicy;

/// Header names.
pub mod header_names {
    /// HIT, MISS, STALE, PENDING, BYPASS or ERROR.
    pub const X_CACHE_STATUS: &str = "X-Cache-Status";
    pub const X_CACHE_KEY: &str = "X-Cache-Key";
    /// Seconds since the page was built.
    pub const X_CACHE_AGE: &str = "X-Cache-Age";
    /// Seconds until the page is regenerated.
    pub const X_CACHE_TTL: &str = "X-Cache-TTL";
    pub const X_CACHE_SCOPE: &str = "X-Cache-Scope";
    pub const X_CACHE_STALE: &str = "X-Cache-Stale";
    pub const X_REQUEST_ID: &str = "X-Request-ID";
    /// Request header asking for every explain header (`1`).
    pub const X_DEBUG_CACHE: &str = "X-Debug-Cache";
}

/// How the page cache answered a request.
///
/// Only the status is sent by default; the rest is sent when the response
/// is verbose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheExplain {
    pub status: CacheStatus,
    pub key: Option<String>,
    pub age: Option<Duration>,
    pub remaining: Option<Duration>,
    pub scope: Option<&'static str>,
}

impl CacheExplain {
    pub fn new(status: CacheStatus) -> Self {
        Self {
            status,
            key: None,
            age: None,
            remaining: None,
            scope: None,
        }
    }

    /// Explain serving `page` at `now`.
    pub fn for_page(
        status: CacheStatus,
        key: &CacheKey,
        page: &CachedPage,
        policy: &PagePolicy,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            status,
            key: Some(key.as_str().to_string()),
            age: Some(page.age(now)),
            remaining: Some(page.remaining_ttl(now)),
            scope: Some(policy.scope.as_str()),
        }
    }

    pub fn with_key(mut self, key: &CacheKey) -> Self {
        self.key = Some(key.as_str().to_string());
        self
    }

    fn push_headers(&self, verbose: bool, out: &mut Vec<(String, String)>) {
        out.push((header_names::X_CACHE_STATUS.to_string(), self.status.to_string()));
        if !verbose {
            return;
        }
        if let Some(key) = &self.key {
            out.push((header_names::X_CACHE_KEY.to_string(), key.clone()));
        }
        if let Some(age) = self.age {
            out.push((header_names::X_CACHE_AGE.to_string(), age.as_secs().to_string()));
        }
        if let Some(remaining) = self.remaining {
            out.push((header_names::X_CACHE_TTL.to_string(), remaining.as_secs().to_string()));
        }
        if let Some(scope) = self.scope {
            out.push((header_names::X_CACHE_SCOPE.to_string(), scope.to_string()));
        }
        if self.status == CacheStatus::Stale {
            out.push((header_names::X_CACHE_STALE.to_string(), "true".to_string()));
        }
    }
}

/// Headers of one page response, in insertion order.
#[derive(Debug, Default)]
pub struct PageHeaders {
    headers: Vec<(String, String)>,
    verbose: bool,
}

impl PageHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send every explain header, not only the status.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn content_type(self, value: &str) -> Self {
        self.header("Content-Type", value)
    }

    pub fn cache_control(self, value: impl Into<String>) -> Self {
        self.header("Cache-Control", value)
    }

    /// Set `ETag`; `tag` is quoted.
    pub fn etag(self, tag: &str) -> Self {
        self.header("ETag", format!("\"{}\"", tag))
    }

    pub fn age(self, age: Duration) -> Self {
        self.header("Age", age.as_secs().to_string())
    }

    pub fn request_id(self, id: &str) -> Self {
        self.header(header_names::X_REQUEST_ID, id)
    }

    pub fn explain(mut self, explain: &CacheExplain) -> Self {
        explain.push_headers(self.verbose, &mut self.headers);
        self
    }

    fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn build(self) -> Vec<(String, String)> {
        self.headers
    }
}

/// Whether request headers ask for verbose cache headers.
pub fn wants_debug_headers<'a>(headers: impl IntoIterator<Item = (&'a str, &'a str)>) -> bool {
    headers
        .into_iter()
        .any(|(name, value)| name.eq_ignore_ascii_case(header_names::X_DEBUG_CACHE) && value == "1")
}

/// Entity tag of a rendered page: length and hash of the HTML.
pub fn generate_etag(html: &str) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    html.hash(&mut hasher);
    format!("{:x}-{:016x}", html.len(), hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn get<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn built_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_page_headers_in_order() {
        let headers = PageHeaders::new()
            .cache_control("public, max-age=1")
            .etag("abc")
            .age(Duration::from_secs(3))
            .content_type("text/html; charset=utf-8")
            .request_id("req-1")
            .build();

        let names: Vec<&str> = headers.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec!["Cache-Control", "ETag", "Age", "Content-Type", "X-Request-ID"]
        );
        assert_eq!(get(&headers, "ETag"), Some("\"abc\""));
    }

    #[test]
    fn test_status_only_unless_verbose() {
        let key = CacheKey::for_page("/recipes/pancakes");
        let explain = CacheExplain::new(CacheStatus::Pending).with_key(&key);

        let quiet = PageHeaders::new().explain(&explain).build();
        assert_eq!(get(&quiet, header_names::X_CACHE_STATUS), Some("PENDING"));
        assert_eq!(get(&quiet, header_names::X_CACHE_KEY), None);

        let verbose = PageHeaders::new().verbose(true).explain(&explain).build();
        assert_eq!(get(&verbose, header_names::X_CACHE_KEY), Some("page:/recipes/pancakes"));
    }

    #[test]
    fn test_explain_stale_page() {
        let policy = PagePolicy::shared(Duration::from_secs(10));
        let page = CachedPage::new("<p>x</p>", true, built_at(), Duration::from_secs(10));
        let key = CacheKey::for_page("/recipes/pancakes");
        let now = built_at() + chrono::Duration::seconds(12);

        let explain = CacheExplain::for_page(CacheStatus::Stale, &key, &page, &policy, now);
        let headers = PageHeaders::new().verbose(true).explain(&explain).build();

        assert_eq!(get(&headers, header_names::X_CACHE_AGE), Some("12"));
        assert_eq!(get(&headers, header_names::X_CACHE_TTL), Some("0"));
        assert_eq!(get(&headers, header_names::X_CACHE_SCOPE), Some("public"));
        assert_eq!(get(&headers, header_names::X_CACHE_STALE), Some("true"));
    }

    #[test]
    fn test_wants_debug_headers() {
        assert!(wants_debug_headers([("x-debug-cache", "1")]));
        assert!(!wants_debug_headers([("x-debug-cache", "0")]));
        assert!(!wants_debug_headers(Vec::<(&str, &str)>::new()));
    }

    #[test]
    fn test_etag_follows_content() {
        assert_eq!(generate_etag("<p>x</p>"), generate_etag("<p>x</p>"));
        assert_ne!(generate_etag("<p>x</p>"), generate_etag("<p>y</p>"));
        assert!(generate_etag("<p>x</p>").starts_with("8-"));
    }
}
