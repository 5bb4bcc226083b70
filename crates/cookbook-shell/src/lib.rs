//! HTML document shell.
//!
//! This crate provides:
//! - `HeadContent` - Title, meta tags and styles for the document head
//! - `Shell` - The document around a page body

mod shell;

pub use shell::*;
