//! Rich-text document model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::RichTextError;

/// Node type of a document root.
pub const DOCUMENT_NODE: &str = "document";

/// A node of the rich-text tree.
///
/// Block and inline nodes carry `content`; text nodes carry `value` and
/// `marks`. `data` holds node-specific attributes such as a hyperlink
/// `uri` or an embed `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Mark>,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl Node {
    /// Create a container node.
    pub fn new(node_type: impl Into<String>, content: Vec<Node>) -> Self {
        Self {
            node_type: node_type.into(),
            content,
            value: None,
            marks: Vec::new(),
            data: Map::new(),
        }
    }

    /// Create a text node.
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            node_type: "text".to_string(),
            content: Vec::new(),
            value: Some(value.into()),
            marks: Vec::new(),
            data: Map::new(),
        }
    }

    /// Create a paragraph holding one text node.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new("paragraph", vec![Self::text(text)])
    }

    /// Add a mark (text nodes only).
    pub fn with_mark(mut self, mark: impl Into<String>) -> Self {
        self.marks.push(Mark { kind: mark.into() });
        self
    }

    /// Set a `data` attribute.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::parse(&self.node_type)
    }

    /// The embed or hyperlink target, resolved or still a link.
    pub fn target(&self) -> Option<&Value> {
        self.data.get("target")
    }

    /// Id of the embed or hyperlink target.
    pub fn target_id(&self) -> Option<&str> {
        self.target()?.pointer("/sys/id")?.as_str()
    }

    /// Concatenated text of this node and its descendants.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.push_text(&mut out);
        out
    }

    fn push_text(&self, out: &mut String) {
        if let Some(value) = &self.value {
            out.push_str(value);
        }
        for (i, child) in self.content.iter().enumerate() {
            if i > 0 && child.kind().is_block() {
                out.push(' ');
            }
            child.push_text(out);
        }
    }
}

/// A text mark such as bold or italic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub kind: String,
}

impl Mark {
    pub fn kind(&self) -> MarkKind {
        MarkKind::parse(&self.kind)
    }
}

/// Node types known to the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Paragraph,
    Heading(u8),
    OrderedList,
    UnorderedList,
    ListItem,
    Hr,
    Quote,
    Table,
    TableRow,
    TableCell,
    TableHeaderCell,
    Hyperlink,
    EntryHyperlink,
    AssetHyperlink,
    EmbeddedEntryBlock,
    EmbeddedEntryInline,
    EmbeddedAssetBlock,
    Text,
    Unknown(String),
}

impl NodeKind {
    pub fn parse(node_type: &str) -> Self {
        match node_type {
            "document" => NodeKind::Document,
            "paragraph" => NodeKind::Paragraph,
            "heading-1" => NodeKind::Heading(1),
            "heading-2" => NodeKind::Heading(2),
            "heading-3" => NodeKind::Heading(3),
            "heading-4" => NodeKind::Heading(4),
            "heading-5" => NodeKind::Heading(5),
            "heading-6" => NodeKind::Heading(6),
            "ordered-list" => NodeKind::OrderedList,
            "unordered-list" => NodeKind::UnorderedList,
            "list-item" => NodeKind::ListItem,
            "hr" => NodeKind::Hr,
            "blockquote" => NodeKind::Quote,
            "table" => NodeKind::Table,
            "table-row" => NodeKind::TableRow,
            "table-cell" => NodeKind::TableCell,
            "table-header-cell" => NodeKind::TableHeaderCell,
            "hyperlink" => NodeKind::Hyperlink,
            "entry-hyperlink" => NodeKind::EntryHyperlink,
            "asset-hyperlink" => NodeKind::AssetHyperlink,
            "embedded-entry-block" => NodeKind::EmbeddedEntryBlock,
            "embedded-entry-inline" => NodeKind::EmbeddedEntryInline,
            "embedded-asset-block" => NodeKind::EmbeddedAssetBlock,
            "text" => NodeKind::Text,
            other => NodeKind::Unknown(other.to_string()),
        }
    }

    /// Block-level nodes start a new line of text.
    pub fn is_block(&self) -> bool {
        !matches!(
            self,
            NodeKind::Text
                | NodeKind::Hyperlink
                | NodeKind::EntryHyperlink
                | NodeKind::AssetHyperlink
                | NodeKind::EmbeddedEntryInline
                | NodeKind::Unknown(_)
        )
    }
}

/// Mark types known to the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkKind {
    Bold,
    Italic,
    Underline,
    Code,
    Superscript,
    Subscript,
    Strikethrough,
    Unknown(String),
}

impl MarkKind {
    pub fn parse(kind: &str) -> Self {
        match kind {
            "bold" => MarkKind::Bold,
            "italic" => MarkKind::Italic,
            "underline" => MarkKind::Underline,
            "code" => MarkKind::Code,
            "superscript" => MarkKind::Superscript,
            "subscript" => MarkKind::Subscript,
            "strikethrough" => MarkKind::Strikethrough,
            other => MarkKind::Unknown(other.to_string()),
        }
    }

    /// HTML element wrapping marked text, if any.
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            MarkKind::Bold => Some("b"),
            MarkKind::Italic => Some("i"),
            MarkKind::Underline => Some("u"),
            MarkKind::Code => Some("code"),
            MarkKind::Superscript => Some("sup"),
            MarkKind::Subscript => Some("sub"),
            MarkKind::Strikethrough => Some("s"),
            MarkKind::Unknown(_) => None,
        }
    }
}

/// A rich-text document: a tree rooted at a `document` node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    root: Node,
}

impl Document {
    /// A document with no content.
    pub fn empty() -> Self {
        Self {
            root: Node::new(DOCUMENT_NODE, Vec::new()),
        }
    }

    /// A document holding the given top-level blocks.
    pub fn new(content: Vec<Node>) -> Self {
        Self {
            root: Node::new(DOCUMENT_NODE, content),
        }
    }

    /// Read a document from its JSON form.
    pub fn from_value(value: &Value) -> Result<Self, RichTextError> {
        let root: Node = serde_json::from_value(value.clone())?;
        if root.node_type != DOCUMENT_NODE {
            return Err(RichTextError::InvalidDocument(format!(
                "root node is '{}', expected '{}'",
                root.node_type, DOCUMENT_NODE
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Top-level blocks.
    pub fn blocks(&self) -> &[Node] {
        &self.root.content
    }

    pub fn is_empty(&self) -> bool {
        self.root.content.is_empty()
    }

    /// Text content with blocks separated by spaces.
    pub fn plain_text(&self) -> String {
        self.root.plain_text()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::empty()
    }
}
