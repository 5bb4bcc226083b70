//! Entry queries.

use std::collections::BTreeMap;

/// Page size used when none is given.
pub const DEFAULT_LIMIT: u32 = 100;
/// Largest page size the delivery API accepts.
pub const MAX_LIMIT: u32 = 1000;
/// Link depth resolved when none is given.
pub const DEFAULT_INCLUDE: u8 = 2;
/// Deepest link resolution the delivery API supports.
pub const MAX_INCLUDE: u8 = 10;

/// A query for entries of one content type, optionally filtered by exact
/// field equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryQuery {
    content_type: Option<String>,
    field_filters: BTreeMap<String, String>,
    select: Vec<String>,
    order: Option<String>,
    limit: u32,
    skip: u32,
    include: u8,
    locale: Option<String>,
}

impl Default for EntryQuery {
    fn default() -> Self {
        Self {
            content_type: None,
            field_filters: BTreeMap::new(),
            select: Vec::new(),
            order: None,
            limit: DEFAULT_LIMIT,
            skip: 0,
            include: DEFAULT_INCLUDE,
            locale: None,
        }
    }
}

impl EntryQuery {
    /// Query all entries of a content type.
    pub fn content_type(content_type: impl Into<String>) -> Self {
        Self {
            content_type: Some(content_type.into()),
            ..Default::default()
        }
    }

    /// Require `fields.<name>` to equal `value`.
    pub fn field_eq(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.field_filters.insert(name.into(), value.into());
        self
    }

    /// Only return the listed paths (e.g. `fields.slug`).
    pub fn select<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Sort order (e.g. `sys.createdAt`).
    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    /// Page size, clamped to `1..=MAX_LIMIT`.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit.clamp(1, MAX_LIMIT);
        self
    }

    /// Number of matching entries to skip.
    pub fn skip(mut self, skip: u32) -> Self {
        self.skip = skip;
        self
    }

    /// Link resolution depth, clamped to `MAX_INCLUDE`.
    pub fn include(mut self, depth: u8) -> Self {
        self.include = depth.min(MAX_INCLUDE);
        self
    }

    /// Request a specific locale.
    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn content_type_id(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Field filters keyed by bare field name.
    pub fn field_filters(&self) -> &BTreeMap<String, String> {
        &self.field_filters
    }

    pub fn selected(&self) -> &[String] {
        &self.select
    }

    pub fn page_limit(&self) -> u32 {
        self.limit
    }

    pub fn page_skip(&self) -> u32 {
        self.skip
    }

    pub fn include_depth(&self) -> u8 {
        self.include
    }

    /// Query string pairs for the delivery API.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();

        if let Some(content_type) = &self.content_type {
            pairs.push(("content_type".to_string(), content_type.clone()));
        }

        for (name, value) in &self.field_filters {
            pairs.push((format!("fields.{}", name), value.clone()));
        }

        if !self.select.is_empty() {
            let mut select = self.select.clone();
            if !select.iter().any(|s| s == "sys" || s.starts_with("sys.")) {
                select.insert(0, "sys".to_string());
            }
            pairs.push(("select".to_string(), select.join(",")));
        }

        if let Some(order) = &self.order {
            pairs.push(("order".to_string(), order.clone()));
        }

        if let Some(locale) = &self.locale {
            pairs.push(("locale".to_string(), locale.clone()));
        }

        pairs.push(("limit".to_string(), self.limit.to_string()));
        pairs.push(("skip".to_string(), self.skip.to_string()));
        pairs.push(("include".to_string(), self.include.to_string()));

        pairs
    }
}
