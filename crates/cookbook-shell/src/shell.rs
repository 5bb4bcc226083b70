//! Document shell.

/// Head content for the shell.
#[derive(Debug, Clone)]
pub struct HeadContent {
    /// Page title.
    pub title: Option<String>,
    /// Meta tags.
    pub meta: Vec<(String, String)>,
    /// Inline `<style>` blocks.
    pub styles: Vec<String>,
}

impl Default for HeadContent {
    fn default() -> Self {
        Self {
            title: None,
            meta: vec![(
                "viewport".to_string(),
                "width=device-width, initial-scale=1".to_string(),
            )],
            styles: Vec::new(),
        }
    }
}

impl HeadContent {
    /// Create new head content with a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Add a meta tag.
    pub fn with_meta(mut self, name: &str, content: &str) -> Self {
        self.meta.push((name.to_string(), content.to_string()));
        self
    }

    /// Add inline CSS styles.
    pub fn with_style(mut self, css: &str) -> Self {
        self.styles.push(format!("<style>{}</style>", css));
        self
    }

    /// Render head content to HTML.
    pub fn render(&self) -> String {
        let mut html = String::from("<meta charset=\"utf-8\">\n");

        if let Some(title) = &self.title {
            html.push_str(&format!("<title>{}</title>\n", escape_html(title)));
        }

        for (name, content) in &self.meta {
            html.push_str(&format!(
                r#"<meta name="{}" content="{}">"#,
                escape_html(name),
                escape_html(content)
            ));
            html.push('\n');
        }

        for style in &self.styles {
            html.push_str(style);
            html.push('\n');
        }

        html
    }
}

/// Document wrapped around a page body: doctype, `<head>` and the
/// `.layout` wrapper the page styles target.
#[derive(Debug, Clone)]
pub struct Shell {
    /// Head content.
    pub head: HeadContent,
}

impl Shell {
    pub fn new(head: HeadContent) -> Self {
        Self { head }
    }

    /// Render a full document around `body`.
    pub fn render(&self, body: &str) -> String {
        let mut html = String::from("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        html.push_str(&self.head.render());
        html.push_str("</head>\n<body>\n<div class=\"layout\">\n<div class=\"page-content\">\n");
        html.push_str(body);
        html.push_str("\n</div>\n</div>\n</body>\n</html>");
        html
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
