//! Lazily-initialized, process-shared connection to the document store.

use std::fs;
use std::path::Path;

use tokio::sync::OnceCell;
use tracing::info;
use visacast_core::Settings;
use visacast_core::config::STORE_URL_VAR;

use crate::{DocStoreClient, StoreError};

/// Provider for the shared document store connection.
///
/// Construct one per process and hand out references; the underlying
/// `reqwest::Client` is built once on first use (single-flight via
/// [`OnceCell`]) and reused by every [`DocStoreClient`] afterwards. The
/// client's own connection pooling makes concurrent use safe — no extra
/// locking here.
pub struct ConnectionProvider {
    settings: Settings,
    http: OnceCell<reqwest::Client>,
}

impl ConnectionProvider {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            http: OnceCell::new(),
        }
    }

    /// Hand out a client bound to the requested database (or the configured
    /// default), reusing the shared connection.
    pub async fn client(&self, database: Option<&str>) -> Result<DocStoreClient, StoreError> {
        let url = self
            .settings
            .store_url
            .as_deref()
            .ok_or(StoreError::Configuration { var: STORE_URL_VAR })?;

        let http = self
            .http
            .get_or_try_init(|| async { build_http(self.settings.ca_bundle.as_deref()) })
            .await?;

        let database = database.unwrap_or(&self.settings.database);
        Ok(DocStoreClient::new(http.clone(), url, database))
    }

    /// Export a whole collection as one batch, resolving the client first.
    ///
    /// `database` overrides the configured default for this call only.
    pub async fn export_collection(
        &self,
        collection: &str,
        database: Option<&str>,
    ) -> Result<arrow::record_batch::RecordBatch, StoreError> {
        let client = self.client(database).await?;
        crate::export_collection(&client, collection).await
    }

    /// Default database name from settings.
    pub fn default_database(&self) -> &str {
        &self.settings.database
    }
}

fn build_http(ca_bundle: Option<&Path>) -> Result<reqwest::Client, StoreError> {
    let mut builder = reqwest::Client::builder().use_rustls_tls();

    if let Some(path) = ca_bundle {
        let pem = fs::read(path).map_err(|e| {
            StoreError::connection(format!("reading CA bundle {}", path.display()), e)
        })?;
        let certs = reqwest::Certificate::from_pem_bundle(&pem).map_err(|e| {
            StoreError::connection(format!("parsing CA bundle {}", path.display()), e)
        })?;
        for cert in certs {
            builder = builder.add_root_certificate(cert);
        }
    }

    let client = builder
        .build()
        .map_err(|e| StoreError::connection("building HTTP client", e))?;

    // Logged once: later calls reuse the cached client.
    info!("document store connection established");
    Ok(client)
}
