//! Server configuration.
//!
//! Loaded from TOML, or JSON when the file ends in `.json`. Every section
//! has defaults, so an empty file is a valid configuration. Store
//! credentials are never read from here; they come from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use cookbook_sdk::cookbook_content::TimeoutConfig;
use cookbook_sdk::cookbook_observability::{LogFormat, DEFAULT_FILTER};
use cookbook_sdk::cookbook_richtext::UnknownNodePolicy;

use crate::renderer::PageRendererConfig;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub pages: PagesConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        Self::parse(path, &content)
    }

    /// Parse config text; `path` only selects the format.
    pub fn parse(path: &str, content: &str) -> Result<Self> {
        if path.ends_with(".json") {
            serde_json::from_str(content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            toml::from_str(content)
                .with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }

    /// Load `path` if given, otherwise use defaults.
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on.
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

/// Where recipes come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreMode {
    /// The CMS delivery API.
    #[default]
    Delivery,
    /// A local JSON file in delivery API shape.
    Fixtures,
}

/// Content store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub mode: StoreMode,

    /// Fixture file used in `fixtures` mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixtures_path: Option<PathBuf>,

    /// Total request timeout against the delivery API.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            mode: StoreMode::default(),
            fixtures_path: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl StoreSettings {
    pub fn timeout(&self) -> TimeoutConfig {
        TimeoutConfig::from_total(Duration::from_millis(self.timeout_ms))
    }
}

fn default_timeout_ms() -> u64 {
    1000
}

/// Page build settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagesConfig {
    #[serde(default = "default_site_name")]
    pub site_name: String,

    #[serde(default = "default_revalidate_secs")]
    pub revalidate_secs: u64,

    #[serde(default = "default_swr_secs")]
    pub stale_while_revalidate_secs: u64,

    /// Build every known page before accepting requests.
    #[serde(default = "default_true")]
    pub prebuild: bool,

    #[serde(default = "default_build_concurrency")]
    pub build_concurrency: usize,

    #[serde(default)]
    pub unknown_nodes: UnknownNodePolicy,

    #[serde(default)]
    pub debug_headers: bool,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            site_name: default_site_name(),
            revalidate_secs: default_revalidate_secs(),
            stale_while_revalidate_secs: default_swr_secs(),
            prebuild: true,
            build_concurrency: default_build_concurrency(),
            unknown_nodes: UnknownNodePolicy::default(),
            debug_headers: false,
        }
    }
}

impl PagesConfig {
    /// Settings for the page renderer.
    pub fn renderer_config(&self) -> PageRendererConfig {
        PageRendererConfig {
            site_name: self.site_name.clone(),
            revalidate: Duration::from_secs(self.revalidate_secs),
            stale_while_revalidate: Duration::from_secs(self.stale_while_revalidate_secs),
            build_concurrency: self.build_concurrency.max(1),
            unknown_nodes: self.unknown_nodes,
            debug_headers: self.debug_headers,
        }
    }
}

fn default_site_name() -> String {
    "Cookbook".to_string()
}

fn default_revalidate_secs() -> u64 {
    1
}

fn default_swr_secs() -> u64 {
    59
}

fn default_build_concurrency() -> usize {
    4
}

fn default_true() -> bool {
    true
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,

    /// `tracing` filter directive. `RUST_LOG` takes precedence.
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: default_filter(),
        }
    }
}

fn default_filter() -> String {
    DEFAULT_FILTER.to_string()
}
