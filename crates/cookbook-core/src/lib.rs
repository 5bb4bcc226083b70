//! Core abstractions for the cookbook page platform.
//!
//! This crate provides the fundamental types:
//! - `RequestContext` - Typed request parameters
//! - `RouteConfig` - Route patterns with `:param` segments
//! - `TimingContext` - Request timing marks
//! - `Clock` - Wall-clock source for cache expiry

mod clock;
mod context;
mod lifecycle;
mod route;

pub use clock::*;
pub use context::*;
pub use lifecycle::*;
pub use route::*;
