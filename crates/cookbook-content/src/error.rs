//! Content store error types.

/// Error type for content store operations.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// The store could not be reached, timed out, rejected our credentials
    /// or failed on its side.
    #[error("Content store unavailable: {0}")]
    StoreUnavailable(String),

    /// The store rejected the request itself.
    #[error("HTTP error: {status} for {url}: {message}")]
    Http {
        status: u16,
        url: String,
        message: String,
    },

    /// The response body was not a valid entry collection.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// An entry lacks a field the page needs, or the field has the wrong shape.
    #[error("Malformed entry {entry_id}: field '{field}' {reason}")]
    MalformedEntry {
        entry_id: String,
        field: String,
        reason: String,
    },

    /// A required configuration value is not set.
    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    /// A fixtures file could not be read or parsed.
    #[error("Fixtures error: {0}")]
    Fixtures(String),
}

impl ContentError {
    /// Build a malformed-entry error.
    pub fn malformed(
        entry_id: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedEntry {
            entry_id: entry_id.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Whether this is a network/auth failure talking to the store.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

impl From<serde_json::Error> for ContentError {
    fn from(e: serde_json::Error) -> Self {
        ContentError::Deserialization(e.to_string())
    }
}

/// Classify a non-success HTTP status from the store.
///
/// Authentication failures, rate limiting and server errors mean the store
/// is unusable for this build; anything else is a bad request.
pub fn error_for_status(status: u16, url: &str, message: impl Into<String>) -> ContentError {
    let message = message.into();
    match status {
        401 | 403 => {
            ContentError::StoreUnavailable(format!("authentication rejected ({status}): {message}"))
        }
        429 => ContentError::StoreUnavailable(format!("rate limited: {message}")),
        500..=599 => ContentError::StoreUnavailable(format!("server error {status}: {message}")),
        _ => ContentError::Http {
            status,
            url: url.to_string(),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_for_status_auth_is_unavailable() {
        assert!(error_for_status(401, "u", "bad token").is_store_unavailable());
        assert!(error_for_status(403, "u", "forbidden").is_store_unavailable());
    }

    #[test]
    fn test_error_for_status_server_errors() {
        assert!(error_for_status(500, "u", "").is_store_unavailable());
        assert!(error_for_status(503, "u", "").is_store_unavailable());
        assert!(error_for_status(429, "u", "").is_store_unavailable());
    }

    #[test]
    fn test_error_for_status_client_error() {
        let err = error_for_status(400, "https://cdn/entries", "InvalidQuery");
        match err {
            ContentError::Http { status, url, .. } => {
                assert_eq!(status, 400);
                assert_eq!(url, "https://cdn/entries");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_display() {
        let err = ContentError::malformed("abc", "title", "is missing");
        assert_eq!(err.to_string(), "Malformed entry abc: field 'title' is missing");
    }
}
