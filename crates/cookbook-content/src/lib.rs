//! Content store access layer.
//!
//! This crate provides:
//! - `ContentStore` - Query interface over a headless content service
//! - `EntryQuery` - Content type and field-equality queries
//! - `Entry` / `Asset` / `EntryCollection` - Delivery API payloads
//! - `LinkResolver` - Replaces link objects with included entries and assets
//! - `DeliveryClient` - HTTP client for the Content Delivery API
//! - `InMemoryStore` - Store backed by in-process data or a fixtures file
//!
//! # Example
//!
//! ```ignore
//! use cookbook_content::{ContentStore, DeliveryClient, EntryQuery, StoreConfig};
//!
//! let client = DeliveryClient::new(StoreConfig::from_env()?)?;
//! let query = EntryQuery::content_type("recipe").field_eq("slug", "pancakes");
//! let recipes = client.query_entries(&query).await?.into_resolved();
//! ```

mod client;
mod config;
mod entry;
mod error;
mod links;
mod memory;
mod query;
mod store;
mod timeout;

pub use client::*;
pub use config::*;
pub use entry::*;
pub use error::*;
pub use links::*;
pub use memory::*;
pub use query::*;
pub use store::*;
pub use timeout::*;
