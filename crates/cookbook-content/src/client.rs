//! Delivery API client.

use async_trait::async_trait;
use tracing::debug;

use crate::config::StoreConfig;
use crate::entry::{ApiErrorBody, EntryCollection};
use crate::error::{error_for_status, ContentError};
use crate::query::EntryQuery;
use crate::store::ContentStore;

/// HTTP client for the Content Delivery API.
///
/// Built once at startup and shared; the underlying connection pool is
/// reused across page builds. Requests are bounded by the configured
/// timeouts and are never retried.
#[derive(Debug, Clone)]
pub struct DeliveryClient {
    http: reqwest::Client,
    config: StoreConfig,
}

impl DeliveryClient {
    /// Create a client from connection settings.
    pub fn new(config: StoreConfig) -> Result<Self, ContentError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.timeout.connect)
            .timeout(config.timeout.total)
            .user_agent(concat!("cookbook-content/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ContentError::StoreUnavailable(e.to_string()))?;
        Ok(Self { http, config })
    }

    /// Connection settings.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn transport_error(&self, err: reqwest::Error) -> ContentError {
        if err.is_timeout() {
            ContentError::StoreUnavailable(format!(
                "request timed out after {:?}",
                self.config.timeout.total
            ))
        } else {
            ContentError::StoreUnavailable(err.to_string())
        }
    }
}

#[async_trait]
impl ContentStore for DeliveryClient {
    async fn query_entries(&self, query: &EntryQuery) -> Result<EntryCollection, ContentError> {
        let url = self.config.entries_url();
        let pairs = query.to_query_pairs();
        debug!(url = %url, query = ?pairs, "querying content store");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.config.access_token)
            .query(&pairs)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ApiErrorBody>(&bytes)
                .map(|body| {
                    if body.sys.id.is_empty() {
                        body.message
                    } else {
                        format!("{}: {}", body.sys.id, body.message)
                    }
                })
                .unwrap_or_else(|_| String::from_utf8_lossy(&bytes).into_owned());
            return Err(error_for_status(status.as_u16(), &url, message));
        }

        let collection: EntryCollection = serde_json::from_slice(&bytes)?;
        debug!(
            total = collection.total,
            returned = collection.items.len(),
            "content store responded"
        );
        Ok(collection)
    }
}
