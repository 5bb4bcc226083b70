//! HTTP server over a real listener.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::oneshot;

use cookbook_sdk::cookbook_content::{Asset, Entry, InMemoryStore, Link};
use cookbook_sdk::cookbook_core::SystemClock;
use recipe_details::{server, PageRenderer, PageRendererConfig, RECIPE_CONTENT_TYPE};

struct TestServer {
    base: String,
    renderer: PageRenderer,
    shutdown: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    async fn start() -> Self {
        let store = InMemoryStore::new()
            .with_entry(
                Entry::new("r1", RECIPE_CONTENT_TYPE)
                    .with_field("slug", "pancakes")
                    .with_field("title", "Pancakes")
                    .with_field("cookingTime", 15)
                    .with_field("featuredImage", Link::asset("img1").to_value())
                    .with_field("ingredients", serde_json::json!(["flour", "eggs"])),
            )
            .with_asset(Asset::image("img1", "//images.ctfassets.net/p.jpg", 800, 600))
            .with_entry(
                Entry::new("r2", RECIPE_CONTENT_TYPE)
                    .with_field("slug", "crêpes")
                    .with_field("title", "Crêpes")
                    .with_field("cookingTime", 10)
                    .with_field("featuredImage", Link::asset("img2").to_value()),
            )
            .with_asset(Asset::image("img2", "//images.ctfassets.net/c.jpg", 800, 600));

        let config = PageRendererConfig {
            revalidate: std::time::Duration::from_secs(60),
            ..Default::default()
        };
        let renderer = PageRenderer::new(Arc::new(store), Arc::new(SystemClock), config);
        renderer.prebuild().await.unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(server::run(listener, renderer.clone(), async move {
            let _ = rx.await;
        }));

        Self {
            base: format!("http://{}", addr),
            renderer,
            shutdown: Some(tx),
            handle,
        }
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.await.unwrap().unwrap();
        self.renderer.settle().await.unwrap();
    }
}

#[tokio::test]
async fn test_serves_recipe_page() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/recipes/pancakes", server.base))
        .header("X-Request-ID", "req-42")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let headers = response.headers().clone();
    assert_eq!(headers["content-type"], "text/html; charset=utf-8");
    assert_eq!(headers["x-cache-status"], "HIT");
    assert_eq!(headers["x-request-id"], "req-42");
    assert!(headers.contains_key("etag"));

    let body = response.text().await.unwrap();
    assert!(body.contains("Takes about 15 mins to cook."));
    assert!(body.contains("<span>flour, </span><span>eggs.</span>"));

    server.stop().await;
}

#[tokio::test]
async fn test_not_modified_with_etag() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let url = format!("{}/recipes/pancakes", server.base);

    let first = client.get(&url).send().await.unwrap();
    let etag = first.headers()["etag"].to_str().unwrap().to_string();

    let second = client
        .get(&url)
        .header("If-None-Match", etag)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), reqwest::StatusCode::NOT_MODIFIED);

    server.stop().await;
}

#[tokio::test]
async fn test_encoded_slug_serves_prebuilt_page() {
    let server = TestServer::start().await;

    let response = reqwest::get(format!("{}/recipes/cr%C3%AApes", server.base))
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.headers()["x-cache-status"], "HIT");
    assert!(response.text().await.unwrap().contains("<h2>Crêpes</h2>"));

    server.stop().await;
}

#[tokio::test]
async fn test_unknown_slug_gets_placeholder() {
    let server = TestServer::start().await;

    let response = reqwest::get(format!("{}/recipes/waffles", server.base))
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.headers()["cache-control"], "no-store");
    assert!(response.text().await.unwrap().contains(r#"class="skeleton""#));

    server.stop().await;
}

#[tokio::test]
async fn test_other_paths_are_404() {
    let server = TestServer::start().await;

    let response = reqwest::get(format!("{}/about", server.base)).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    assert!(response.headers().contains_key("x-request-id"));

    let health = reqwest::get(format!("{}/healthz", server.base)).await.unwrap();
    assert_eq!(health.status(), reqwest::StatusCode::OK);
    assert_eq!(health.text().await.unwrap(), "ok");

    server.stop().await;
}
