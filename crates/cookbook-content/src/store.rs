//! The content store interface.

use std::sync::Arc;

use async_trait::async_trait;

use crate::entry::EntryCollection;
use crate::error::ContentError;
use crate::query::EntryQuery;

/// Read-only query interface over a headless content service.
///
/// Implementations are shared process-wide behind an `Arc` and must not
/// hold per-request state.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Fetch one page of entries matching the query.
    ///
    /// Link objects in the returned items are unresolved; the linked
    /// entries and assets come back in `includes`.
    async fn query_entries(&self, query: &EntryQuery) -> Result<EntryCollection, ContentError>;
}

#[async_trait]
impl<S: ContentStore + ?Sized> ContentStore for Arc<S> {
    async fn query_entries(&self, query: &EntryQuery) -> Result<EntryCollection, ContentError> {
        (**self).query_entries(query).await
    }
}
