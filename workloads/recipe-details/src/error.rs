//! Page build errors.

use cookbook_sdk::cookbook_cache::CacheError;
use cookbook_sdk::cookbook_content::ContentError;
use cookbook_sdk::cookbook_richtext::RichTextError;

/// Errors raised while building a recipe page.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    /// Content store failure or malformed recipe entry.
    #[error(transparent)]
    Content(#[from] ContentError),

    /// Method could not be rendered.
    #[error("method rendering failed: {0}")]
    RichText(#[from] RichTextError),

    /// Page cache failure.
    #[error("page cache failed: {0}")]
    Cache(#[from] CacheError),

    /// A background build task could not be joined.
    #[error("build task failed: {0}")]
    Task(String),
}

impl PageError {
    /// Whether the content store could not be reached.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, PageError::Content(e) if e.is_store_unavailable())
    }

    /// Whether a matched entry was missing required data.
    pub fn is_malformed_entry(&self) -> bool {
        matches!(self, PageError::Content(ContentError::MalformedEntry { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let unavailable = PageError::from(ContentError::StoreUnavailable("down".into()));
        assert!(unavailable.is_store_unavailable());
        assert!(!unavailable.is_malformed_entry());

        let malformed = PageError::from(ContentError::malformed("r1", "title", "is missing"));
        assert!(malformed.is_malformed_entry());
        assert!(!malformed.is_store_unavailable());
    }

    #[test]
    fn test_display_is_transparent_for_content() {
        let err = PageError::from(ContentError::StoreUnavailable("down".into()));
        assert_eq!(err.to_string(), ContentError::StoreUnavailable("down".into()).to_string());
    }
}
