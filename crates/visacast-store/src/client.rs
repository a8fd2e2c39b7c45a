//! HTTP client bound to one named database of the document store.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::StoreError;
use crate::export::DocumentSource;

/// A handle to one database of the document store.
///
/// Cheap to create: the inner `reqwest::Client` is the shared, pooled
/// connection handle owned by [`ConnectionProvider`](crate::ConnectionProvider);
/// this type only pins it to a base URL and database name.
#[derive(Debug, Clone)]
pub struct DocStoreClient {
    http: reqwest::Client,
    base_url: String,
    database: String,
}

impl DocStoreClient {
    pub(crate) fn new(http: reqwest::Client, base_url: &str, database: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            database: database.to_string(),
        }
    }

    /// Name of the database this client is bound to.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Retrieve every document in a collection, in store-native order.
    ///
    /// The store returns a JSON array of documents; no ordering guarantee is
    /// added on top of whatever the store provides.
    pub async fn fetch_all(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        let url = format!("{}/{}/{}", self.base_url, self.database, collection);
        debug!(url = %url, "fetching collection");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| StoreError::data_access(collection, e))?
            .error_for_status()
            .map_err(|e| StoreError::data_access(collection, e))?;

        let docs: Vec<Value> = resp
            .json()
            .await
            .map_err(|e| StoreError::data_access(collection, e))?;

        info!(count = docs.len(), collection, "retrieved documents");
        Ok(docs)
    }
}

#[async_trait]
impl DocumentSource for DocStoreClient {
    async fn fetch_all(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        DocStoreClient::fetch_all(self, collection).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_trims_trailing_slash() {
        let client = DocStoreClient::new(
            reqwest::Client::new(),
            "https://store.example.com/",
            "visacast",
        );
        assert_eq!(client.base_url, "https://store.example.com");
        assert_eq!(client.database(), "visacast");
    }
}
