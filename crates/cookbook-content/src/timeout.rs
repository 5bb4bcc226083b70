//! Timeout configuration for store requests.

use std::time::Duration;

/// Timeout configuration for a store request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Connection timeout.
    pub connect: Duration,
    /// Total operation timeout.
    pub total: Duration,
}

impl TimeoutConfig {
    /// Create a new timeout configuration.
    pub fn new(connect: Duration, total: Duration) -> Self {
        Self { connect, total }
    }

    /// Create from a single total timeout.
    pub fn from_total(total: Duration) -> Self {
        Self {
            connect: Duration::from_millis(total.as_millis() as u64 / 4),
            total,
        }
    }

    /// Defaults for content management APIs.
    pub fn for_cms() -> Self {
        Self::from_total(Duration::from_millis(1000))
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self::for_cms()
    }
}
