//! Public SDK for the cookbook page platform.
//!
//! This crate re-exports all platform functionality:
//!
//! ```ignore
//! use cookbook_sdk::prelude::*;
//!
//! async fn load(store: &dyn ContentStore, slug: &str) -> Result<Vec<Entry>, ContentError> {
//!     let query = EntryQuery::content_type("recipe").field_eq("slug", slug);
//!     Ok(store.query_entries(&query).await?.into_resolved())
//! }
//! ```

pub use cookbook_cache;
pub use cookbook_content;
pub use cookbook_core;
pub use cookbook_observability;
pub use cookbook_richtext;
pub use cookbook_shell;

/// Prelude for convenient imports.
pub mod prelude {
    pub use cookbook_cache::*;
    pub use cookbook_content::*;
    pub use cookbook_core::*;
    pub use cookbook_observability::*;
    pub use cookbook_richtext::*;
    pub use cookbook_shell::*;
}
