//! `recipe-details` - serves recipe pages.
//!
//! Store credentials are read from `CONTENTFUL_SPACE_ID` and
//! `CONTENTFUL_ACCESS_KEY` unless `--fixtures` (or `store.mode =
//! "fixtures"`) points at a local JSON file.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use cookbook_sdk::cookbook_content::{ContentStore, DeliveryClient, InMemoryStore, StoreConfig};
use cookbook_sdk::cookbook_core::SystemClock;
use cookbook_sdk::cookbook_observability::{init_tracing, LogFormat};

use recipe_details::config::{AppConfig, StoreMode};
use recipe_details::{server, PageRenderer};

/// Recipe detail page server
#[derive(Parser)]
#[command(name = "recipe-details")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file path (TOML, or JSON by extension)
    #[arg(short, long)]
    config: Option<String>,

    /// Address to listen on
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Serve recipes from a JSON fixture file instead of the CMS
    #[arg(long)]
    fixtures: Option<PathBuf>,

    /// Skip building known pages at startup
    #[arg(long)]
    no_prebuild: bool,

    /// Log format (json or human)
    #[arg(long)]
    log_format: Option<LogFormat>,

    /// Seconds before a built page is regenerated
    #[arg(long)]
    revalidate_secs: Option<u64>,
}

impl Cli {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(bind) = self.bind {
            config.server.bind = bind;
        }
        if let Some(path) = &self.fixtures {
            config.store.mode = StoreMode::Fixtures;
            config.store.fixtures_path = Some(path.clone());
        }
        if self.no_prebuild {
            config.pages.prebuild = false;
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
        if let Some(secs) = self.revalidate_secs {
            config.pages.revalidate_secs = secs;
        }
    }
}

fn content_store(config: &AppConfig) -> Result<Arc<dyn ContentStore>> {
    match config.store.mode {
        StoreMode::Delivery => {
            let store_config = StoreConfig::from_env()
                .context("Failed to read content store settings from the environment")?
                .with_timeout(config.store.timeout());
            let client = DeliveryClient::new(store_config)
                .context("Failed to create content delivery client")?;
            Ok(Arc::new(client))
        }
        StoreMode::Fixtures => {
            let Some(path) = &config.store.fixtures_path else {
                bail!("store.mode is \"fixtures\" but no fixtures_path is set");
            };
            let store = InMemoryStore::load(path)
                .with_context(|| format!("Failed to load fixtures: {}", path.display()))?;
            info!(path = %path.display(), entries = store.len(), "loaded fixtures");
            Ok(Arc::new(store))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    cli.apply(&mut config);

    init_tracing(config.logging.format, &config.logging.filter)
        .context("Failed to initialize logging")?;

    let store = content_store(&config)?;
    let renderer = PageRenderer::new(
        store,
        Arc::new(SystemClock),
        config.pages.renderer_config(),
    );

    if config.pages.prebuild {
        let pages = renderer.prebuild().await.context("Prebuild failed")?;
        info!(pages, "prebuilt recipe pages");
    }

    let listener = TcpListener::bind(config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    info!(addr = %config.server.bind, "listening");

    server::run(listener, renderer.clone(), shutdown_signal())
        .await
        .context("Server failed")?;

    renderer.settle().await.context("Background builds failed")?;
    Ok(())
}
