//! In-process content store.

use std::collections::HashSet;
use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::entry::{Asset, Entry, EntryCollection, Includes};
use crate::error::ContentError;
use crate::links::{collect_links, LinkRef, LinkTarget};
use crate::query::EntryQuery;
use crate::store::ContentStore;

/// A content store held in memory.
///
/// Applies the same query semantics as the delivery API for the parts of
/// it this platform uses: content type match, exact field equality (array
/// fields match when any element is equal), `select` projection,
/// `skip`/`limit` paging with `total`, and `includes` for linked entries
/// and assets down to the include depth. Entries are returned in
/// insertion order; `order` is ignored.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: RwLock<Vec<Entry>>,
    assets: RwLock<Vec<Asset>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry.
    pub fn with_entry(self, entry: Entry) -> Self {
        self.insert_entry(entry);
        self
    }

    /// Add an asset.
    pub fn with_asset(self, asset: Asset) -> Self {
        self.insert_asset(asset);
        self
    }

    /// Build a store from a saved delivery API response.
    ///
    /// Items and included entries become entries; included assets become
    /// assets.
    pub fn from_collection(collection: EntryCollection) -> Self {
        let store = Self::new();
        for entry in collection.items.into_iter().chain(collection.includes.entries) {
            store.insert_entry(entry);
        }
        for asset in collection.includes.assets {
            store.insert_asset(asset);
        }
        store
    }

    /// Parse a saved delivery API response.
    pub fn from_json(json: &str) -> Result<Self, ContentError> {
        let collection: EntryCollection =
            serde_json::from_str(json).map_err(|e| ContentError::Fixtures(e.to_string()))?;
        Ok(Self::from_collection(collection))
    }

    /// Load a saved delivery API response from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ContentError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ContentError::Fixtures(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Insert or replace an entry (matched by id).
    pub fn insert_entry(&self, entry: Entry) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        match entries.iter_mut().find(|e| e.sys.id == entry.sys.id) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
    }

    /// Remove an entry by id.
    pub fn remove_entry(&self, id: &str) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|e| e.sys.id != id);
        entries.len() != before
    }

    /// Insert or replace an asset (matched by id).
    pub fn insert_asset(&self, asset: Asset) {
        let mut assets = self.assets.write().unwrap_or_else(|e| e.into_inner());
        match assets.iter_mut().find(|a| a.sys.id == asset.sys.id) {
            Some(existing) => *existing = asset,
            None => assets.push(asset),
        }
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn collect_includes(
        &self,
        items: &[Entry],
        depth: u8,
        entries: &[Entry],
        assets: &[Asset],
    ) -> Includes {
        let mut includes = Includes::default();
        let mut seen: HashSet<LinkRef> = HashSet::new();
        let item_ids: HashSet<&str> = items.iter().map(|e| e.id()).collect();

        let mut frontier: Vec<Value> = items
            .iter()
            .map(|e| Value::Object(e.fields.clone()))
            .collect();

        for _ in 0..depth {
            let mut links = HashSet::new();
            for value in &frontier {
                collect_links(value, &mut links);
            }

            let mut next = Vec::new();
            for link in links {
                if !seen.insert(link.clone()) {
                    continue;
                }
                match link.target {
                    LinkTarget::Asset => {
                        if let Some(asset) = assets.iter().find(|a| a.sys.id == link.id) {
                            includes.assets.push(asset.clone());
                        }
                    }
                    LinkTarget::Entry => {
                        if item_ids.contains(link.id.as_str()) {
                            continue;
                        }
                        if let Some(entry) = entries.iter().find(|e| e.sys.id == link.id) {
                            next.push(Value::Object(entry.fields.clone()));
                            includes.entries.push(entry.clone());
                        }
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }

        includes
    }
}

fn field_matches(value: Option<&Value>, expected: &str) -> bool {
    match value {
        Some(Value::String(s)) => s == expected,
        Some(Value::Number(n)) => n.to_string() == expected,
        Some(Value::Bool(b)) => b.to_string() == expected,
        Some(Value::Array(items)) => items.iter().any(|v| field_matches(Some(v), expected)),
        _ => false,
    }
}

fn project(entry: &Entry, select: &[String]) -> Entry {
    if select.is_empty() || select.iter().any(|s| s == "fields") {
        return entry.clone();
    }
    let keep: HashSet<&str> = select
        .iter()
        .filter_map(|s| s.strip_prefix("fields."))
        .collect();
    let fields: Map<String, Value> = entry
        .fields
        .iter()
        .filter(|(k, _)| keep.contains(k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    Entry {
        sys: entry.sys.clone(),
        fields,
    }
}

#[async_trait]
impl ContentStore for InMemoryStore {
    async fn query_entries(&self, query: &EntryQuery) -> Result<EntryCollection, ContentError> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner()).clone();
        let assets = self.assets.read().unwrap_or_else(|e| e.into_inner()).clone();

        let matching: Vec<&Entry> = entries
            .iter()
            .filter(|entry| match query.content_type_id() {
                Some(content_type) => entry.content_type_id() == Some(content_type),
                None => true,
            })
            .filter(|entry| {
                query
                    .field_filters()
                    .iter()
                    .all(|(name, expected)| field_matches(entry.field(name), expected))
            })
            .collect();

        let total = matching.len() as u64;
        let page: Vec<Entry> = matching
            .into_iter()
            .skip(query.page_skip() as usize)
            .take(query.page_limit() as usize)
            .cloned()
            .collect();

        let includes = self.collect_includes(&page, query.include_depth(), &entries, &assets);
        let items = page
            .iter()
            .map(|entry| project(entry, query.selected()))
            .collect();

        Ok(EntryCollection {
            total,
            skip: query.page_skip() as u64,
            limit: query.page_limit() as u64,
            items,
            includes,
        })
    }
}
