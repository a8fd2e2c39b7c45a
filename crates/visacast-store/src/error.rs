use thiserror::Error;
use visacast_core::FrameError;

type Cause = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document store URL not configured (set {var})")]
    Configuration { var: &'static str },

    #[error("establishing document store connection ({context}): {source}")]
    Connection {
        context: String,
        #[source]
        source: Cause,
    },

    #[error("retrieving documents from collection '{collection}': {source}")]
    DataAccess {
        collection: String,
        #[source]
        source: Cause,
    },

    #[error("collection name must not be empty")]
    EmptyCollectionName,

    #[error("materializing collection '{collection}': {source}")]
    Frame {
        collection: String,
        #[source]
        source: FrameError,
    },
}

impl StoreError {
    pub(crate) fn connection(context: impl Into<String>, source: impl Into<Cause>) -> Self {
        Self::Connection {
            context: context.into(),
            source: source.into(),
        }
    }

    pub(crate) fn data_access(collection: impl Into<String>, source: impl Into<Cause>) -> Self {
        Self::DataAccess {
            collection: collection.into(),
            source: source.into(),
        }
    }
}
