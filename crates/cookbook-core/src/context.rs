//! Per-request state handed to the page renderer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use http::Method;

use crate::lifecycle::TimingContext;
use crate::route::RouteParams;

static REQUEST_SEQ: AtomicU64 = AtomicU64::new(0);

/// Identifier carried through logs and the `X-Request-ID` header.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(pub String);

impl RequestId {
    /// Fresh id for a request that arrived without one.
    ///
    /// Combines the wall-clock time with a process-wide sequence number, so
    /// two ids generated in the same nanosecond still differ.
    pub fn generate() -> Self {
        let nanos = chrono::Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_default();
        let seq = REQUEST_SEQ.fetch_add(1, Ordering::Relaxed);
        Self(format!("{:x}-{:x}", nanos, seq))
    }

    /// Wrap an id received from upstream.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Request headers by name. Lookups through [`RequestContext::header`]
/// ignore case.
pub type Headers = HashMap<String, String>;

/// One incoming request.
#[derive(Debug)]
pub struct RequestContext {
    pub request_id: RequestId,
    pub method: Method,
    /// Path without the query string, still percent-encoded.
    pub path: String,
    /// Filled in once the path matched a route.
    pub params: RouteParams,
    pub headers: Headers,
    /// Phase marks for the request log line.
    pub timing: TimingContext,
}

impl RequestContext {
    /// Context for `method path` with a generated request id.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            request_id: RequestId::generate(),
            method,
            path: path.into(),
            params: HashMap::new(),
            headers: HashMap::new(),
            timing: TimingContext::new(),
        }
    }

    /// Reuse a request id supplied by an upstream proxy.
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Attach request headers.
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Route parameter, e.g. `slug`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(|s| s.as_str())
    }

    /// Header value; `name` is matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
