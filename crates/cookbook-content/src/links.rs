//! Link resolution.
//!
//! The delivery API returns references as link objects and ships the
//! referenced entries and assets once, in `includes`. Resolution replaces
//! each link inside item fields with a copy of its target, recursively, up
//! to the requested depth. Links whose target was not included stay links.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::entry::{Entry, EntryCollection};
use crate::query::DEFAULT_INCLUDE;

/// Kind of object a link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkTarget {
    Entry,
    Asset,
}

/// A link found inside a field value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LinkRef {
    pub target: LinkTarget,
    pub id: String,
}

/// Recognize a link object.
pub fn as_link(value: &Value) -> Option<LinkRef> {
    let sys = value.as_object()?.get("sys")?.as_object()?;
    if sys.get("type")?.as_str()? != "Link" {
        return None;
    }
    let target = match sys.get("linkType")?.as_str()? {
        "Entry" => LinkTarget::Entry,
        "Asset" => LinkTarget::Asset,
        _ => return None,
    };
    let id = sys.get("id")?.as_str()?.to_string();
    Some(LinkRef { target, id })
}

/// Collect every entry/asset link inside a value.
pub fn collect_links(value: &Value, out: &mut HashSet<LinkRef>) {
    if let Some(link) = as_link(value) {
        out.insert(link);
        return;
    }
    match value {
        Value::Array(items) => items.iter().for_each(|v| collect_links(v, out)),
        Value::Object(map) => map
            .iter()
            .filter(|(k, _)| k.as_str() != "sys")
            .for_each(|(_, v)| collect_links(v, out)),
        _ => {}
    }
}

/// Resolves links against a fixed set of entries and assets.
#[derive(Debug, Default)]
pub struct LinkResolver {
    entries: HashMap<String, Value>,
    assets: HashMap<String, Value>,
    max_depth: u8,
}

impl LinkResolver {
    /// Create an empty resolver.
    pub fn new(max_depth: u8) -> Self {
        Self {
            entries: HashMap::new(),
            assets: HashMap::new(),
            max_depth,
        }
    }

    /// Index a collection's items and includes.
    ///
    /// Items are indexed too, since an item may link to another item of
    /// the same page.
    pub fn from_collection(collection: &EntryCollection, max_depth: u8) -> Self {
        let mut resolver = Self::new(max_depth);
        for entry in collection.items.iter().chain(collection.includes.entries.iter()) {
            if let Ok(value) = serde_json::to_value(entry) {
                resolver.entries.insert(entry.sys.id.clone(), value);
            }
        }
        for asset in &collection.includes.assets {
            if let Ok(value) = serde_json::to_value(asset) {
                resolver.assets.insert(asset.sys.id.clone(), value);
            }
        }
        resolver
    }

    fn lookup(&self, link: &LinkRef) -> Option<&Value> {
        match link.target {
            LinkTarget::Entry => self.entries.get(&link.id),
            LinkTarget::Asset => self.assets.get(&link.id),
        }
    }

    /// Resolve links inside an entry's fields.
    pub fn resolve_entry(&self, entry: &mut Entry) {
        for value in entry.fields.values_mut() {
            self.resolve_value(value, 0);
        }
    }

    /// Resolve links inside a value, `depth` links deep already.
    pub fn resolve_value(&self, value: &mut Value, depth: u8) {
        if let Some(link) = as_link(value) {
            if depth >= self.max_depth {
                return;
            }
            if let Some(target) = self.lookup(&link) {
                let mut resolved = target.clone();
                self.resolve_nested(&mut resolved, depth + 1);
                *value = resolved;
            }
            return;
        }
        self.resolve_nested(value, depth);
    }

    fn resolve_nested(&self, value: &mut Value, depth: u8) {
        match value {
            Value::Array(items) => {
                for item in items.iter_mut() {
                    self.resolve_value(item, depth);
                }
            }
            Value::Object(map) => {
                for (key, item) in map.iter_mut() {
                    if key != "sys" {
                        self.resolve_value(item, depth);
                    }
                }
            }
            _ => {}
        }
    }
}

impl EntryCollection {
    /// Items with links resolved to the default include depth.
    pub fn into_resolved(self) -> Vec<Entry> {
        self.into_resolved_with_depth(DEFAULT_INCLUDE)
    }

    /// Items with links resolved to `depth`.
    pub fn into_resolved_with_depth(self, depth: u8) -> Vec<Entry> {
        let resolver = LinkResolver::from_collection(&self, depth);
        let mut items = self.items;
        for item in items.iter_mut() {
            resolver.resolve_entry(item);
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{Asset, Includes, Link};
    use serde_json::json;

    fn collection_with_image() -> EntryCollection {
        let recipe = Entry::new("r1", "recipe")
            .with_field("slug", "pancakes")
            .with_field("featuredImage", Link::asset("img1").to_value());
        EntryCollection {
            total: 1,
            skip: 0,
            limit: 100,
            items: vec![recipe],
            includes: Includes {
                entries: Vec::new(),
                assets: vec![Asset::image("img1", "//images.ctfassets.net/x/y.jpg", 1200, 800)],
            },
        }
    }

    #[test]
    fn test_as_link() {
        let link = as_link(&Link::asset("img1").to_value()).unwrap();
        assert_eq!(link.target, LinkTarget::Asset);
        assert_eq!(link.id, "img1");

        assert!(as_link(&json!({"sys": {"type": "Entry", "id": "x"}})).is_none());
        assert!(as_link(&Link::content_type("recipe").to_value()).is_none());
        assert!(as_link(&json!("text")).is_none());
    }

    #[test]
    fn test_resolve_asset_link() {
        let items = collection_with_image().into_resolved();
        let image = items[0].field("featuredImage").unwrap();

        assert_eq!(
            image.pointer("/fields/file/url").and_then(Value::as_str),
            Some("//images.ctfassets.net/x/y.jpg")
        );
        assert_eq!(
            image.pointer("/fields/file/details/image/width").and_then(Value::as_u64),
            Some(1200)
        );
    }

    #[test]
    fn test_unresolvable_link_stays_link() {
        let mut collection = collection_with_image();
        collection.includes.assets.clear();

        let items = collection.into_resolved();
        assert!(as_link(items[0].field("featuredImage").unwrap()).is_some());
    }

    #[test]
    fn test_resolve_links_inside_rich_text() {
        let method = json!({
            "nodeType": "document",
            "data": {},
            "content": [{
                "nodeType": "embedded-entry-block",
                "data": { "target": Link::entry("tip1").to_value() },
                "content": []
            }]
        });
        let recipe = Entry::new("r1", "recipe").with_field("method", method);
        let tip = Entry::new("tip1", "tip").with_field("title", "Rest the batter");
        let collection = EntryCollection {
            items: vec![recipe],
            includes: Includes {
                entries: vec![tip],
                assets: Vec::new(),
            },
            ..Default::default()
        };

        let items = collection.into_resolved();
        let target = items[0]
            .field("method")
            .and_then(|m| m.pointer("/content/0/data/target/fields/title"))
            .and_then(Value::as_str);
        assert_eq!(target, Some("Rest the batter"));
    }

    #[test]
    fn test_cyclic_links_stop_at_depth() {
        let a = Entry::new("a", "node").with_field("next", Link::entry("b").to_value());
        let b = Entry::new("b", "node").with_field("next", Link::entry("a").to_value());
        let collection = EntryCollection {
            items: vec![a, b],
            ..Default::default()
        };

        let items = collection.into_resolved_with_depth(2);
        let first = &items[0];
        let depth_two = first
            .field("next")
            .and_then(|v| v.pointer("/fields/next/fields/next"))
            .unwrap();
        assert!(as_link(depth_two).is_some());
    }

    #[test]
    fn test_collect_links() {
        let mut links = HashSet::new();
        collect_links(
            &json!({
                "featuredImage": Link::asset("img1").to_value(),
                "related": [Link::entry("r2").to_value(), Link::entry("r3").to_value()]
            }),
            &mut links,
        );
        assert_eq!(links.len(), 3);
    }
}
