//! Rich-text documents.
//!
//! This crate provides:
//! - `Document` / `Node` - The structured rich-text tree stored by the content service
//! - `NodeKind` / `MarkKind` - Typed views of node and mark names
//! - `HtmlRenderer` - Renders a document to escaped HTML
//! - `EmbedRenderer` - Hook for embedded entries and assets
//! - `UnknownNodePolicy` - What to do with node types this renderer does not know

mod document;
mod error;
mod escape;
mod render;

pub use document::*;
pub use error::*;
pub use escape::*;
pub use render::*;
