//! Page renderer: static paths, static props, prebuild and incremental
//! serving with a placeholder while a page is first built.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt, TryStreamExt};
use http::{Method, StatusCode};
use serde::Serialize;
use tokio::task::JoinHandle;

use cookbook_sdk::cookbook_cache::{
    header_names, wants_debug_headers, CacheExplain, CacheKey, CacheStatus, CachedPage, Lookup,
    PageCache, PageHeaders, PagePolicy,
};
use cookbook_sdk::cookbook_content::ContentStore;
use cookbook_sdk::cookbook_core::{Clock, LifecyclePhase, RequestContext, RouteConfig};
use cookbook_sdk::cookbook_observability::StructuredLogger;
use cookbook_sdk::cookbook_richtext::{HtmlRenderer, UnknownNodePolicy};

use crate::error::PageError;
use crate::model::{PathDescriptor, RecipeRenderModel, RECIPE_ROUTE};
use crate::render::PageTemplate;
use crate::resolver::RecipeResolver;

/// Workload name used in logs.
pub const WORKLOAD: &str = "recipe-details";

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
const NO_STORE: &str = "no-store";

/// Shortest revalidate interval; page ages are tracked in whole seconds.
pub const MIN_REVALIDATE: Duration = Duration::from_secs(1);

/// Renderer settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRendererConfig {
    /// Suffix of every page title.
    pub site_name: String,
    /// Interval after which a built page is regenerated. Raised to
    /// [`MIN_REVALIDATE`] when shorter.
    pub revalidate: Duration,
    /// How long downstream caches may serve a stale page.
    pub stale_while_revalidate: Duration,
    /// Pages built concurrently during prebuild.
    pub build_concurrency: usize,
    pub unknown_nodes: UnknownNodePolicy,
    /// Emit every cache explain header, not only `X-Cache-Status`.
    pub debug_headers: bool,
}

impl Default for PageRendererConfig {
    fn default() -> Self {
        Self {
            site_name: "Cookbook".to_string(),
            revalidate: Duration::from_secs(1),
            stale_while_revalidate: Duration::from_secs(59),
            build_concurrency: 4,
            unknown_nodes: UnknownNodePolicy::default(),
            debug_headers: false,
        }
    }
}

/// Pages known at build time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaticPaths {
    pub paths: Vec<PathDescriptor>,
    /// Unknown paths are built on first request instead of returning 404.
    pub fallback: bool,
}

/// Input of one page build.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaticProps {
    /// `None` when no recipe has the slug yet.
    pub recipe: Option<RecipeRenderModel>,
    pub revalidate: Duration,
}

/// A rendered HTTP response.
#[derive(Debug, Clone)]
pub struct PageResponse {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub cache_status: CacheStatus,
}

impl PageResponse {
    /// First header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn plain(ctx: &RequestContext, status: StatusCode, message: &str) -> Self {
        Self {
            status,
            headers: vec![
                ("Content-Type".to_string(), HTML_CONTENT_TYPE.to_string()),
                ("Cache-Control".to_string(), NO_STORE.to_string()),
                (header_names::X_REQUEST_ID.to_string(), ctx.request_id.to_string()),
            ],
            body: format!("<!DOCTYPE html>\n<html><body><h1>{}</h1></body></html>", message),
            cache_status: CacheStatus::Bypass,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum BuildKind {
    Fill,
    Regenerate,
}

impl BuildKind {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Fill => "fill",
            Self::Regenerate => "regenerate",
        }
    }
}

struct Inner {
    resolver: RecipeResolver,
    cache: PageCache,
    clock: Arc<dyn Clock>,
    rich_text: HtmlRenderer,
    template: PageTemplate,
    route: RouteConfig,
    policy: PagePolicy,
    config: PageRendererConfig,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

/// Builds and serves recipe pages.
///
/// Cloning is cheap; clones share the page cache and background tasks.
/// Background builds run on the tokio runtime, so `serve` must be called
/// from within one.
#[derive(Clone)]
pub struct PageRenderer {
    inner: Arc<Inner>,
}

impl PageRenderer {
    /// Create a renderer with an in-memory page cache.
    pub fn new(
        store: Arc<dyn ContentStore>,
        clock: Arc<dyn Clock>,
        config: PageRendererConfig,
    ) -> Self {
        Self::with_cache(store, clock, config, PageCache::default())
    }

    /// Create a renderer over an existing page cache.
    pub fn with_cache(
        store: Arc<dyn ContentStore>,
        clock: Arc<dyn Clock>,
        mut config: PageRendererConfig,
        cache: PageCache,
    ) -> Self {
        config.revalidate = config.revalidate.max(MIN_REVALIDATE);
        let policy = PagePolicy::shared(config.revalidate)
            .with_stale_while_revalidate(config.stale_while_revalidate);

        Self {
            inner: Arc::new(Inner {
                resolver: RecipeResolver::new(store),
                cache,
                clock,
                rich_text: HtmlRenderer::new().with_unknown_nodes(config.unknown_nodes),
                template: PageTemplate::new(config.site_name.clone()),
                route: RouteConfig::new(RECIPE_ROUTE, "recipe").with_methods(vec!["GET", "HEAD"]),
                policy,
                config,
                tasks: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &PageRendererConfig {
        &self.inner.config
    }

    pub fn cache(&self) -> &PageCache {
        &self.inner.cache
    }

    /// Every recipe page known to the store. Paths outside the list are
    /// built on demand.
    pub async fn get_static_paths(&self) -> Result<StaticPaths, PageError> {
        let paths = self.inner.resolver.enumerate_slugs().await?;
        Ok(StaticPaths {
            paths,
            fallback: true,
        })
    }

    /// Props of the page for `slug`.
    pub async fn get_static_props(&self, slug: &str) -> Result<StaticProps, PageError> {
        let recipe = self.inner.resolver.resolve(slug).await?;
        Ok(StaticProps {
            recipe,
            revalidate: self.inner.config.revalidate,
        })
    }

    /// Resolve and render the page for `slug` without touching the cache.
    pub async fn build_page(&self, slug: &str) -> Result<CachedPage, PageError> {
        let props = self.get_static_props(slug).await?;
        let html = self
            .inner
            .template
            .render(props.recipe.as_ref(), &self.inner.rich_text)?;
        Ok(CachedPage::new(
            html,
            props.recipe.is_some(),
            self.inner.clock.now(),
            props.revalidate,
        ))
    }

    /// Build every known page and store it.
    ///
    /// Nothing is stored unless every page builds. Returns the number of
    /// pages stored.
    pub async fn prebuild(&self) -> Result<usize, PageError> {
        let started = Instant::now();
        let paths = self.get_static_paths().await?.paths;
        let concurrency = self.inner.config.build_concurrency.max(1);

        let pages: Vec<(PathDescriptor, CachedPage)> = stream::iter(paths)
            .map(|path| async move {
                let page = self.build_page(&path.slug).await?;
                Ok::<_, PageError>((path, page))
            })
            .buffer_unordered(concurrency)
            .try_collect()
            .await?;

        for (path, page) in &pages {
            self.inner
                .cache
                .complete(&CacheKey::for_page(&path.path()), page.clone())
                .await?;
        }

        tracing::info!(
            pages = pages.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "prebuild finished"
        );
        Ok(pages.len())
    }

    /// Serve a GET request for `path`.
    pub async fn serve(&self, path: &str) -> PageResponse {
        self.serve_request(RequestContext::new(Method::GET, path)).await
    }

    /// Serve a request.
    pub async fn serve_request(&self, mut ctx: RequestContext) -> PageResponse {
        let logger = StructuredLogger::new(ctx.request_id.clone())
            .with_workload(WORKLOAD)
            .with_route(&ctx.path);
        ctx.timing.mark_phase(LifecyclePhase::Start);

        let Some(params) = self.inner.route.match_path(&ctx.path) else {
            logger.debug_builder("no route").field("path", ctx.path.clone()).emit();
            return PageResponse::plain(&ctx, StatusCode::NOT_FOUND, "Not Found");
        };
        if !self.inner.route.accepts(ctx.method.as_str()) {
            return PageResponse::plain(&ctx, StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
        }
        let slug = params.get("slug").cloned().unwrap_or_default();
        ctx.params = params;

        let key = CacheKey::for_page(&PathDescriptor::new(slug.as_str()).path());
        let now = self.inner.clock.now();

        let response = match self.inner.cache.lookup(&key, now).await {
            Ok(Lookup::Fresh(page)) => self.page_response(&ctx, &key, &page, CacheStatus::Hit),
            Ok(Lookup::Stale(page)) => {
                match self.inner.cache.try_begin_revalidate(&key, now).await {
                    Ok(true) => {
                        self.spawn_build(key.clone(), slug, BuildKind::Regenerate, logger.clone())
                    }
                    Ok(false) => {}
                    Err(e) => logger
                        .warn_builder("could not claim regeneration")
                        .field("error", e.to_string())
                        .emit(),
                }
                self.page_response(&ctx, &key, &page, CacheStatus::Stale)
            }
            Ok(Lookup::Pending) => self.placeholder_response(&ctx, &key, CacheStatus::Pending),
            Ok(Lookup::Miss) => {
                match self.inner.cache.begin_fill(&key, now).await {
                    Ok(true) => self.spawn_build(key.clone(), slug, BuildKind::Fill, logger.clone()),
                    Ok(false) => {}
                    Err(e) => logger
                        .warn_builder("could not start page fill")
                        .field("error", e.to_string())
                        .emit(),
                }
                self.placeholder_response(&ctx, &key, CacheStatus::Miss)
            }
            Err(e) => {
                logger
                    .warn_builder("page cache unavailable; building inline")
                    .field("error", e.to_string())
                    .emit();
                self.bypass_response(&ctx, &key, &slug, &logger).await
            }
        };

        ctx.timing.mark_phase(LifecyclePhase::Completion);
        logger
            .info_builder("request completed")
            .field("slug", ctx.param("slug").unwrap_or_default())
            .field("cache_status", response.cache_status.to_string())
            .field_i64("status", i64::from(response.status.as_u16()))
            .duration_ms(
                "duration_ms",
                ctx.timing.time_to(LifecyclePhase::Completion).unwrap_or_default(),
            )
            .emit();

        response
    }

    /// Wait for every background build started so far, including builds
    /// started while waiting.
    pub async fn settle(&self) -> Result<(), PageError> {
        loop {
            let handles = {
                let mut tasks = self.inner.tasks.lock().unwrap_or_else(|e| e.into_inner());
                std::mem::take(&mut *tasks)
            };
            if handles.is_empty() {
                return Ok(());
            }
            for handle in handles {
                handle.await.map_err(|e| PageError::Task(e.to_string()))?;
            }
        }
    }

    /// Number of background builds not yet awaited.
    pub fn in_flight(&self) -> usize {
        let mut tasks = self.inner.tasks.lock().unwrap_or_else(|e| e.into_inner());
        tasks.retain(|handle| !handle.is_finished());
        tasks.len()
    }

    fn spawn_build(&self, key: CacheKey, slug: String, kind: BuildKind, logger: StructuredLogger) {
        let renderer = self.clone();
        let handle = tokio::spawn(async move {
            renderer.run_build(key, slug, kind, logger).await;
        });

        let mut tasks = self.inner.tasks.lock().unwrap_or_else(|e| e.into_inner());
        tasks.retain(|handle| !handle.is_finished());
        tasks.push(handle);
    }

    async fn run_build(&self, key: CacheKey, slug: String, kind: BuildKind, logger: StructuredLogger) {
        let started = Instant::now();
        // Only found pages are stored; the next request for a missing slug
        // builds again.
        let built = match self.build_page(&slug).await {
            Ok(page) if page.found => self
                .inner
                .cache
                .complete(&key, page)
                .await
                .map(|_| true)
                .map_err(PageError::from),
            Ok(_) => self
                .inner
                .cache
                .discard(&key)
                .await
                .map(|_| false)
                .map_err(PageError::from),
            Err(e) => Err(e),
        };

        match built {
            Ok(found) => logger
                .info_builder("page built")
                .field("slug", slug)
                .field("kind", kind.as_str())
                .field_bool("found", found)
                .duration_ms("build_ms", started.elapsed())
                .emit(),
            Err(e) => {
                logger
                    .error_builder("page build failed")
                    .field("slug", slug)
                    .field("kind", kind.as_str())
                    .field("error", e.to_string())
                    .emit();
                let released = match kind {
                    BuildKind::Fill => self.inner.cache.abandon(&key).await,
                    BuildKind::Regenerate => self.inner.cache.end_revalidate(&key).await,
                };
                if let Err(e) = released {
                    logger
                        .warn_builder("could not release page build")
                        .field("error", e.to_string())
                        .emit();
                }
            }
        }
    }

    async fn bypass_response(
        &self,
        ctx: &RequestContext,
        key: &CacheKey,
        slug: &str,
        logger: &StructuredLogger,
    ) -> PageResponse {
        match self.build_page(slug).await {
            Ok(page) => self.page_response(ctx, key, &page, CacheStatus::Bypass),
            Err(e) => {
                logger
                    .error_builder("page build failed")
                    .field("slug", slug)
                    .field("error", e.to_string())
                    .emit();
                let status = if e.is_store_unavailable() {
                    StatusCode::SERVICE_UNAVAILABLE
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                let mut response = PageResponse::plain(ctx, status, "Something went wrong");
                response.cache_status = CacheStatus::Error;
                response
            }
        }
    }

    fn verbose_headers(&self, ctx: &RequestContext) -> bool {
        self.inner.config.debug_headers
            || wants_debug_headers(ctx.headers.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    fn page_response(
        &self,
        ctx: &RequestContext,
        key: &CacheKey,
        page: &CachedPage,
        status: CacheStatus,
    ) -> PageResponse {
        let now = self.inner.clock.now();
        let policy = &self.inner.policy;
        let explain = CacheExplain::for_page(status, key, page, policy, now);

        let headers = PageHeaders::new()
            .verbose(self.verbose_headers(ctx))
            .content_type(HTML_CONTENT_TYPE)
            .cache_control(policy.cache_control_for(page))
            .etag(&page.etag)
            .age(page.age(now))
            .explain(&explain)
            .request_id(ctx.request_id.as_str())
            .build();

        let quoted = format!("\"{}\"", page.etag);
        let not_modified = ctx
            .header("if-none-match")
            .map(|value| value.split(',').any(|tag| tag.trim() == quoted || tag.trim() == "*"))
            .unwrap_or(false);

        let (code, body) = if not_modified {
            (StatusCode::NOT_MODIFIED, String::new())
        } else {
            (StatusCode::OK, page.html.clone())
        };

        PageResponse {
            status: code,
            headers,
            body,
            cache_status: status,
        }
    }

    fn placeholder_response(
        &self,
        ctx: &RequestContext,
        key: &CacheKey,
        status: CacheStatus,
    ) -> PageResponse {
        let headers = PageHeaders::new()
            .verbose(self.verbose_headers(ctx))
            .content_type(HTML_CONTENT_TYPE)
            .cache_control(NO_STORE)
            .explain(&CacheExplain::new(status).with_key(key))
            .request_id(ctx.request_id.as_str())
            .build();

        PageResponse {
            status: StatusCode::OK,
            headers,
            body: self.inner.template.render_placeholder(),
            cache_status: status,
        }
    }
}

impl std::fmt::Debug for PageRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageRenderer")
            .field("config", &self.inner.config)
            .field("resolver", &self.inner.resolver)
            .finish_non_exhaustive()
    }
}
