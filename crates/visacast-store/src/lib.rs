//! Document store access: shared connection provider, HTTP client, tabular export.

mod client;
mod error;
mod export;
mod provider;

pub use client::DocStoreClient;
pub use error::StoreError;
pub use export::{DocumentSource, export_collection};
pub use provider::ConnectionProvider;
