//! Observability for the cookbook page platform.
//!
//! This crate provides:
//! - `StructuredLogger` - Structured logging with request context
//! - `init_tracing` - Subscriber setup with env filter and JSON or human output

mod logging;
mod subscriber;

pub use logging::*;
pub use subscriber::*;

// Re-export RequestId and TimingContext from cookbook-core for convenience
pub use cookbook_core::{RequestId, TimingContext};
