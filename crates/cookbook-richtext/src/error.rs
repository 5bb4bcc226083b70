//! Rich-text errors.

/// Errors raised while reading or rendering a rich-text document.
#[derive(Debug, thiserror::Error)]
pub enum RichTextError {
    /// Value is not a rich-text document.
    #[error("invalid rich-text document: {0}")]
    InvalidDocument(String),

    /// Node type not known to the renderer, under `UnknownNodePolicy::Fail`.
    #[error("unknown rich-text node type '{0}'")]
    UnknownNode(String),

    /// Document nests deeper than the renderer allows.
    #[error("rich-text document nests deeper than {0} levels")]
    TooDeep(usize),
}

impl From<serde_json::Error> for RichTextError {
    fn from(err: serde_json::Error) -> Self {
        RichTextError::InvalidDocument(err.to_string())
    }
}
