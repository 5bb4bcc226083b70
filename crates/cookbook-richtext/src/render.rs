//! HTML rendering of rich-text documents.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::document::{Document, MarkKind, Node, NodeKind};
use crate::error::RichTextError;
use crate::escape::escape_html;

/// Deepest nesting the renderer will descend into.
pub const MAX_DEPTH: usize = 64;

/// Handling of node types the renderer does not recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownNodePolicy {
    /// Render the node's children without a wrapper.
    #[default]
    RenderChildren,
    /// Drop the node and its children.
    Skip,
    /// Fail the render with `RichTextError::UnknownNode`.
    Fail,
}

/// Renders embedded entries, embedded assets and entry/asset hyperlinks.
///
/// `target` is the node's `data.target`: the linked entry or asset when
/// links were resolved, otherwise the bare link object.
pub trait EmbedRenderer: Send + Sync {
    fn entry_block(&self, target: Option<&Value>) -> String;

    fn entry_inline(&self, target: Option<&Value>) -> String;

    fn asset_block(&self, target: Option<&Value>) -> String;

    fn entry_hyperlink(&self, target: Option<&Value>, inner_html: &str) -> String;

    fn asset_hyperlink(&self, target: Option<&Value>, inner_html: &str) -> String;
}

/// Default embed rendering: a tagged container carrying the target id and,
/// when resolved, its title.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEmbeds;

fn target_id(target: Option<&Value>) -> &str {
    target
        .and_then(|t| t.pointer("/sys/id"))
        .and_then(Value::as_str)
        .unwrap_or_default()
}

fn target_field<'a>(target: Option<&'a Value>, pointer: &str) -> Option<&'a str> {
    target?.pointer(pointer)?.as_str()
}

fn https_url(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{}", url)
    } else {
        url.to_string()
    }
}

impl EmbedRenderer for DefaultEmbeds {
    fn entry_block(&self, target: Option<&Value>) -> String {
        format!(
            r#"<div class="embedded-entry" data-entry-id="{}">{}</div>"#,
            escape_html(target_id(target)),
            escape_html(target_field(target, "/fields/title").unwrap_or_default())
        )
    }

    fn entry_inline(&self, target: Option<&Value>) -> String {
        format!(
            r#"<span class="embedded-entry" data-entry-id="{}">{}</span>"#,
            escape_html(target_id(target)),
            escape_html(target_field(target, "/fields/title").unwrap_or_default())
        )
    }

    fn asset_block(&self, target: Option<&Value>) -> String {
        let id = escape_html(target_id(target));
        let title = target_field(target, "/fields/title").unwrap_or_default();
        match target_field(target, "/fields/file/url") {
            Some(url) => format!(
                r#"<figure class="embedded-asset" data-asset-id="{}"><img src="{}" alt="{}"></figure>"#,
                id,
                escape_html(&https_url(url)),
                escape_html(title)
            ),
            None => format!(
                r#"<div class="embedded-asset" data-asset-id="{}">{}</div>"#,
                id,
                escape_html(title)
            ),
        }
    }

    fn entry_hyperlink(&self, target: Option<&Value>, inner_html: &str) -> String {
        format!(
            r#"<span class="entry-hyperlink" data-entry-id="{}">{}</span>"#,
            escape_html(target_id(target)),
            inner_html
        )
    }

    fn asset_hyperlink(&self, target: Option<&Value>, inner_html: &str) -> String {
        match target_field(target, "/fields/file/url") {
            Some(url) => format!(r#"<a href="{}">{}</a>"#, escape_html(&https_url(url)), inner_html),
            None => format!(
                r#"<span class="asset-hyperlink" data-asset-id="{}">{}</span>"#,
                escape_html(target_id(target)),
                inner_html
            ),
        }
    }
}

/// Renders rich-text documents to HTML.
///
/// Text and attribute values are escaped. Newlines inside text become
/// `<br/>`. Marks wrap text in the order they appear; unknown marks leave
/// the text unwrapped.
pub struct HtmlRenderer {
    embeds: Box<dyn EmbedRenderer>,
    unknown_nodes: UnknownNodePolicy,
}

impl HtmlRenderer {
    /// Renderer with default embeds and the default unknown-node policy.
    pub fn new() -> Self {
        Self {
            embeds: Box::new(DefaultEmbeds),
            unknown_nodes: UnknownNodePolicy::default(),
        }
    }

    /// Use a custom embed renderer.
    pub fn with_embeds(mut self, embeds: impl EmbedRenderer + 'static) -> Self {
        self.embeds = Box::new(embeds);
        self
    }

    /// Set the unknown-node policy.
    pub fn with_unknown_nodes(mut self, policy: UnknownNodePolicy) -> Self {
        self.unknown_nodes = policy;
        self
    }

    pub fn unknown_nodes(&self) -> UnknownNodePolicy {
        self.unknown_nodes
    }

    /// Render a document.
    pub fn render(&self, document: &Document) -> Result<String, RichTextError> {
        let mut out = String::new();
        self.render_children(document.root(), 0, &mut out)?;
        Ok(out)
    }

    fn render_children(&self, node: &Node, depth: usize, out: &mut String) -> Result<(), RichTextError> {
        for child in &node.content {
            self.render_node(child, depth + 1, out)?;
        }
        Ok(())
    }

    fn inner(&self, node: &Node, depth: usize) -> Result<String, RichTextError> {
        let mut inner = String::new();
        self.render_children(node, depth, &mut inner)?;
        Ok(inner)
    }

    fn wrap(&self, tag: &str, node: &Node, depth: usize, out: &mut String) -> Result<(), RichTextError> {
        out.push('<');
        out.push_str(tag);
        out.push('>');
        self.render_children(node, depth, out)?;
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
        Ok(())
    }

    fn render_node(&self, node: &Node, depth: usize, out: &mut String) -> Result<(), RichTextError> {
        if depth > MAX_DEPTH {
            return Err(RichTextError::TooDeep(MAX_DEPTH));
        }

        match node.kind() {
            NodeKind::Text => render_text(node, out),
            NodeKind::Document => self.render_children(node, depth, out)?,
            NodeKind::Paragraph => self.wrap("p", node, depth, out)?,
            NodeKind::Heading(level) => self.wrap(&format!("h{}", level), node, depth, out)?,
            NodeKind::OrderedList => self.wrap("ol", node, depth, out)?,
            NodeKind::UnorderedList => self.wrap("ul", node, depth, out)?,
            NodeKind::ListItem => self.wrap("li", node, depth, out)?,
            NodeKind::Quote => self.wrap("blockquote", node, depth, out)?,
            NodeKind::Hr => out.push_str("<hr/>"),
            NodeKind::Table => {
                out.push_str("<table><tbody>");
                self.render_children(node, depth, out)?;
                out.push_str("</tbody></table>");
            }
            NodeKind::TableRow => self.wrap("tr", node, depth, out)?,
            NodeKind::TableCell => self.wrap("td", node, depth, out)?,
            NodeKind::TableHeaderCell => self.wrap("th", node, depth, out)?,
            NodeKind::Hyperlink => {
                let inner = self.inner(node, depth)?;
                match node.data.get("uri").and_then(Value::as_str) {
                    Some(uri) => out.push_str(&format!(r#"<a href="{}">{}</a>"#, escape_html(uri), inner)),
                    None => out.push_str(&inner),
                }
            }
            NodeKind::EntryHyperlink => {
                let inner = self.inner(node, depth)?;
                out.push_str(&self.embeds.entry_hyperlink(node.target(), &inner));
            }
            NodeKind::AssetHyperlink => {
                let inner = self.inner(node, depth)?;
                out.push_str(&self.embeds.asset_hyperlink(node.target(), &inner));
            }
            NodeKind::EmbeddedEntryBlock => out.push_str(&self.embeds.entry_block(node.target())),
            NodeKind::EmbeddedEntryInline => out.push_str(&self.embeds.entry_inline(node.target())),
            NodeKind::EmbeddedAssetBlock => out.push_str(&self.embeds.asset_block(node.target())),
            NodeKind::Unknown(node_type) => match self.unknown_nodes {
                UnknownNodePolicy::RenderChildren => {
                    debug!(node_type = %node_type, "rendering children of unknown rich-text node");
                    self.render_children(node, depth, out)?;
                }
                UnknownNodePolicy::Skip => {
                    debug!(node_type = %node_type, "skipping unknown rich-text node");
                }
                UnknownNodePolicy::Fail => return Err(RichTextError::UnknownNode(node_type)),
            },
        }
        Ok(())
    }
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HtmlRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtmlRenderer")
            .field("unknown_nodes", &self.unknown_nodes)
            .finish_non_exhaustive()
    }
}

fn render_text(node: &Node, out: &mut String) {
    let value = node.value.as_deref().unwrap_or_default();
    let mut html = value
        .split('\n')
        .map(escape_html)
        .collect::<Vec<_>>()
        .join("<br/>");

    for mark in &node.marks {
        match mark.kind() {
            MarkKind::Unknown(kind) => debug!(mark = %kind, "ignoring unknown rich-text mark"),
            known => {
                if let Some(tag) = known.tag() {
                    html = format!("<{tag}>{html}</{tag}>");
                }
            }
        }
    }
    out.push_str(&html);
}
