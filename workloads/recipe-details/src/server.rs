//! HTTP server.

use std::collections::HashMap;
use std::future::Future;

use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::warn;

use cookbook_sdk::cookbook_core::{RequestContext, RequestId};

use crate::model::RECIPE_ROUTE;
use crate::renderer::{PageRenderer, PageResponse};

/// Application routes. Paths other than recipe pages and the health check
/// still go through the renderer so they get its 404 page.
pub fn router(renderer: PageRenderer) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(RECIPE_ROUTE, get(page))
        .fallback(page)
        .with_state(renderer)
}

/// Serve until `shutdown` resolves.
pub async fn run(
    listener: TcpListener,
    renderer: PageRenderer,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, router(renderer))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn healthz() -> &'static str {
    "ok"
}

async fn page(
    State(renderer): State<PageRenderer>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> PageResponse {
    renderer
        .serve_request(request_context(method, &uri, &headers))
        .await
}

/// Request context for an incoming request. The path is kept
/// percent-encoded and without the query string; route matching decodes
/// parameters. An `X-Request-ID` set by a proxy is kept.
pub fn request_context(method: Method, uri: &Uri, headers: &HeaderMap) -> RequestContext {
    let headers: HashMap<String, String> = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();

    let mut ctx = RequestContext::new(method, uri.path());
    if let Some(id) = headers.get("x-request-id").filter(|id| !id.is_empty()) {
        ctx = ctx.with_request_id(RequestId::from_string(id.clone()));
    }
    ctx.with_headers(headers)
}

impl IntoResponse for PageResponse {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.body).into_response();
        let headers = response.headers_mut();

        for (name, value) in self.headers {
            match (
                HeaderName::try_from(name.as_str()),
                HeaderValue::try_from(value.as_str()),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => warn!(header = %name, "dropping invalid response header"),
            }
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use cookbook_sdk::cookbook_cache::{header_names, CacheStatus};

    // === Request Context Tests ===

    #[test]
    fn test_request_context_from_parts() {
        let uri: Uri = "/recipes/pancakes?preview=1".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("X-Request-ID", HeaderValue::from_static("req-123"));
        headers.insert("If-None-Match", HeaderValue::from_static("\"abc\""));

        let ctx = request_context(Method::GET, &uri, &headers);

        assert_eq!(ctx.path, "/recipes/pancakes");
        assert_eq!(ctx.request_id.as_str(), "req-123");
        assert_eq!(ctx.header("if-none-match"), Some("\"abc\""));
    }

    #[test]
    fn test_request_context_generates_id() {
        let uri: Uri = "/recipes/pancakes".parse().unwrap();
        let ctx = request_context(Method::GET, &uri, &HeaderMap::new());
        assert!(!ctx.request_id.as_str().is_empty());
    }

    // === Response Tests ===

    #[test]
    fn test_page_response_into_response() {
        let page = PageResponse {
            status: StatusCode::OK,
            headers: vec![
                ("Content-Type".to_string(), "text/html; charset=utf-8".to_string()),
                ("X-Cache-Status".to_string(), "HIT".to_string()),
                ("Bad Header".to_string(), "x".to_string()),
            ],
            body: "<p>hi</p>".to_string(),
            cache_status: CacheStatus::Hit,
        };

        let response = page.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "text/html; charset=utf-8"
        );
        assert_eq!(response.headers().get("x-cache-status").unwrap(), "HIT");
        assert!(response.headers().get(header_names::X_REQUEST_ID).is_none());
    }
}
