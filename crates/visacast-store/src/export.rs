//! Export layer: document collection → Arrow RecordBatch.

use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use serde_json::Value;
use tracing::info;
use visacast_core::documents_to_batch;

use crate::StoreError;

/// Source of raw documents for one database.
///
/// The production implementation is [`DocStoreClient`](crate::DocStoreClient);
/// tests substitute an in-memory fake.
#[async_trait]
pub trait DocumentSource {
    /// All documents of a collection, in store-native order.
    async fn fetch_all(&self, collection: &str) -> Result<Vec<Value>, StoreError>;
}

/// Retrieve every document of a collection and materialize it as one batch.
///
/// The batch is built fresh per call and owned by the caller — nothing is
/// cached here. Column order and missing-value handling follow
/// [`documents_to_batch`].
pub async fn export_collection<S>(source: &S, collection: &str) -> Result<RecordBatch, StoreError>
where
    S: DocumentSource + Sync + ?Sized,
{
    if collection.is_empty() {
        return Err(StoreError::EmptyCollectionName);
    }

    let docs = source.fetch_all(collection).await?;
    let batch = documents_to_batch(&docs).map_err(|source| StoreError::Frame {
        collection: collection.to_string(),
        source,
    })?;

    info!(
        rows = batch.num_rows(),
        columns = batch.num_columns(),
        collection,
        "exported collection"
    );
    Ok(batch)
}
