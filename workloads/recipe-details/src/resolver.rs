//! Recipe lookups against the content store.

use std::collections::HashSet;
use std::sync::Arc;

use cookbook_sdk::cookbook_content::{ContentStore, EntryQuery, DEFAULT_INCLUDE, MAX_LIMIT};
use tracing::{debug, warn};

use crate::error::PageError;
use crate::model::{PathDescriptor, RecipeRenderModel, RECIPE_CONTENT_TYPE};

/// Resolves recipe slugs and recipe pages from a content store.
///
/// Holds no state besides the store handle; every call queries the store.
#[derive(Clone)]
pub struct RecipeResolver {
    store: Arc<dyn ContentStore>,
    page_size: u32,
}

impl RecipeResolver {
    /// Create a resolver over a store.
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self {
            store,
            page_size: MAX_LIMIT,
        }
    }

    /// Set the page size used when listing recipes.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// List every recipe slug.
    ///
    /// Pages through the store until `total` entries were seen. The first
    /// entry with a slug wins; later entries with the same slug are logged
    /// and dropped. Entries without a slug cannot be routed and are
    /// skipped.
    pub async fn enumerate_slugs(&self) -> Result<Vec<PathDescriptor>, PageError> {
        let mut seen = HashSet::new();
        let mut paths = Vec::new();
        let mut skip = 0u32;

        loop {
            let query = EntryQuery::content_type(RECIPE_CONTENT_TYPE)
                .select(["fields.slug"])
                .order("sys.createdAt")
                .include(0)
                .limit(self.page_size)
                .skip(skip);
            let page = self.store.query_entries(&query).await?;
            let returned = page.items.len() as u32;

            for entry in &page.items {
                let Some(slug) = entry.field_str("slug") else {
                    warn!(entry_id = %entry.id(), "recipe entry has no slug; skipping");
                    continue;
                };
                if seen.insert(slug.to_string()) {
                    paths.push(PathDescriptor::new(slug));
                } else {
                    warn!(
                        entry_id = %entry.id(),
                        slug = %slug,
                        "duplicate recipe slug; keeping the first entry"
                    );
                }
            }

            skip = skip.saturating_add(returned);
            if returned == 0 || u64::from(skip) >= page.total {
                break;
            }
        }

        debug!(count = paths.len(), "enumerated recipe slugs");
        Ok(paths)
    }

    /// Load the recipe with `slug`.
    ///
    /// `Ok(None)` when no recipe has the slug. When several do, the first
    /// is used and the ambiguity is logged.
    pub async fn resolve(&self, slug: &str) -> Result<Option<RecipeRenderModel>, PageError> {
        let query = EntryQuery::content_type(RECIPE_CONTENT_TYPE)
            .field_eq("slug", slug)
            .include(DEFAULT_INCLUDE)
            .limit(2);
        let collection = self.store.query_entries(&query).await?;

        if collection.total > 1 {
            warn!(
                slug = %slug,
                matches = collection.total,
                "several recipes share a slug; using the first"
            );
        }

        let Some(entry) = collection.into_resolved_with_depth(DEFAULT_INCLUDE).into_iter().next()
        else {
            debug!(slug = %slug, "no recipe for slug");
            return Ok(None);
        };

        Ok(Some(RecipeRenderModel::from_entry(&entry)?))
    }
}

impl std::fmt::Debug for RecipeResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecipeResolver")
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cookbook_sdk::cookbook_content::{
        Asset, ContentError, Entry, EntryCollection, InMemoryStore, Link,
    };
    use serde_json::json;

    struct FailingStore;

    #[async_trait]
    impl ContentStore for FailingStore {
        async fn query_entries(&self, _query: &EntryQuery) -> Result<EntryCollection, ContentError> {
            Err(ContentError::StoreUnavailable("connection refused".into()))
        }
    }

    fn recipe(id: &str, slug: &str, title: &str) -> Entry {
        Entry::new(id, RECIPE_CONTENT_TYPE)
            .with_field("slug", slug)
            .with_field("title", title)
            .with_field("cookingTime", 20)
            .with_field("featuredImage", Link::asset(format!("img-{id}")).to_value())
            .with_field("ingredients", json!(["flour", "milk"]))
    }

    fn image(id: &str) -> Asset {
        Asset::image(format!("img-{id}"), format!("//images.ctfassets.net/{id}.jpg"), 640, 480)
    }

    fn resolver(store: InMemoryStore) -> RecipeResolver {
        RecipeResolver::new(Arc::new(store))
    }

    // === Enumerate Tests ===

    #[tokio::test]
    async fn test_enumerate_slugs() {
        let store = InMemoryStore::new()
            .with_entry(recipe("r1", "pancakes", "Pancakes"))
            .with_entry(recipe("r2", "crepes", "Crepes"));

        let paths = resolver(store).enumerate_slugs().await.unwrap();
        assert_eq!(
            paths,
            vec![PathDescriptor::new("pancakes"), PathDescriptor::new("crepes")]
        );
    }

    #[tokio::test]
    async fn test_enumerate_empty_store() {
        let paths = resolver(InMemoryStore::new()).enumerate_slugs().await.unwrap();
        assert!(paths.is_empty());
    }

    #[tokio::test]
    async fn test_enumerate_pages_through_store() {
        let store = InMemoryStore::new();
        for i in 0..7 {
            store.insert_entry(recipe(&format!("r{i}"), &format!("dish-{i}"), "Dish"));
        }

        let paths = resolver(store).with_page_size(3).enumerate_slugs().await.unwrap();
        assert_eq!(paths.len(), 7);
        assert_eq!(paths[6], PathDescriptor::new("dish-6"));
    }

    #[tokio::test]
    async fn test_enumerate_first_duplicate_wins() {
        let store = InMemoryStore::new()
            .with_entry(recipe("r1", "pancakes", "Pancakes"))
            .with_entry(recipe("r2", "waffles", "Waffles"))
            .with_entry(recipe("r3", "pancakes", "Other Pancakes"));

        let paths = resolver(store).enumerate_slugs().await.unwrap();
        assert_eq!(
            paths,
            vec![PathDescriptor::new("pancakes"), PathDescriptor::new("waffles")]
        );
    }

    #[tokio::test]
    async fn test_enumerate_skips_entries_without_slug() {
        let store = InMemoryStore::new()
            .with_entry(Entry::new("r0", RECIPE_CONTENT_TYPE).with_field("title", "Draft"))
            .with_entry(recipe("r1", "pancakes", "Pancakes"));

        let paths = resolver(store).enumerate_slugs().await.unwrap();
        assert_eq!(paths, vec![PathDescriptor::new("pancakes")]);
    }

    #[tokio::test]
    async fn test_enumerate_store_unavailable() {
        let err = RecipeResolver::new(Arc::new(FailingStore))
            .enumerate_slugs()
            .await
            .unwrap_err();
        assert!(err.is_store_unavailable());
    }

    // === Resolve Tests ===

    #[tokio::test]
    async fn test_resolve_found() {
        let store = InMemoryStore::new()
            .with_entry(recipe("r1", "pancakes", "Pancakes"))
            .with_asset(image("r1"));

        let model = resolver(store).resolve("pancakes").await.unwrap().unwrap();
        assert_eq!(model.title, "Pancakes");
        assert_eq!(model.featured_image.url, "//images.ctfassets.net/r1.jpg");
        assert_eq!(model.featured_image.width, 640);
    }

    #[tokio::test]
    async fn test_resolve_not_found() {
        let store = InMemoryStore::new()
            .with_entry(recipe("r1", "pancakes", "Pancakes"))
            .with_asset(image("r1"));

        assert!(resolver(store).resolve("waffles").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resolve_duplicate_uses_first() {
        let store = InMemoryStore::new()
            .with_entry(recipe("r1", "pancakes", "First"))
            .with_entry(recipe("r2", "pancakes", "Second"))
            .with_asset(image("r1"))
            .with_asset(image("r2"));

        let model = resolver(store).resolve("pancakes").await.unwrap().unwrap();
        assert_eq!(model.title, "First");
    }

    #[tokio::test]
    async fn test_resolve_malformed_entry() {
        let store = InMemoryStore::new().with_entry(recipe("r1", "pancakes", "Pancakes"));

        let err = resolver(store).resolve("pancakes").await.unwrap_err();
        assert!(err.is_malformed_entry());
    }

    #[tokio::test]
    async fn test_resolve_store_unavailable() {
        let err = RecipeResolver::new(Arc::new(FailingStore))
            .resolve("pancakes")
            .await
            .unwrap_err();
        assert!(matches!(err, PageError::Content(ContentError::StoreUnavailable(_))));
    }
}
