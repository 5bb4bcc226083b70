//! Recipe detail pages.
//!
//! Serves `/recipes/{slug}` from recipes held in a headless CMS:
//! - [`RecipeResolver`] lists recipe slugs and loads one recipe as a
//!   [`RecipeRenderModel`]
//! - [`PageTemplate`] renders the banner, cooking time, ingredients and the
//!   rich-text method, or a loading placeholder
//! - [`PageRenderer`] prebuilds known pages, builds unknown ones on first
//!   request and regenerates stale ones in the background
//! - [`server::router`] exposes the renderer over HTTP

pub mod config;
mod error;
mod model;
mod render;
mod renderer;
mod resolver;
pub mod server;
mod styles;

pub use config::AppConfig;
pub use error::*;
pub use model::*;
pub use render::*;
pub use renderer::*;
pub use resolver::*;
pub use styles::*;
