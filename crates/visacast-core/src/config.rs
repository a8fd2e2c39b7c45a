//! Environment-supplied settings: store URL, database/collection names, artifact path.

use std::env;
use std::path::PathBuf;

/// Environment variable holding the document store base URL.
pub const STORE_URL_VAR: &str = "VISACAST_STORE_URL";
/// Environment variable overriding the default database name.
pub const DATABASE_VAR: &str = "VISACAST_DATABASE";
/// Environment variable overriding the default collection name.
pub const COLLECTION_VAR: &str = "VISACAST_COLLECTION";
/// Environment variable overriding the model artifact path.
pub const MODEL_PATH_VAR: &str = "VISACAST_MODEL_PATH";
/// Environment variable pointing at a PEM certificate bundle for TLS.
pub const CA_BUNDLE_VAR: &str = "VISACAST_CA_BUNDLE";

pub const DEFAULT_DATABASE: &str = "visacast";
pub const DEFAULT_COLLECTION: &str = "applications";
pub const DEFAULT_MODEL_PATH: &str = "artifacts/model.json";

/// Process-level configuration, read once at startup.
///
/// `store_url` stays optional here — commands that never touch the document
/// store (e.g. predicting from a local artifact) must not fail on a missing
/// URL. The connection provider raises the configuration error when a store
/// operation actually needs it.
#[derive(Debug, Clone)]
pub struct Settings {
    pub store_url: Option<String>,
    pub database: String,
    pub collection: String,
    pub model_path: PathBuf,
    pub ca_bundle: Option<PathBuf>,
}

impl Settings {
    /// Read settings from the environment, falling back to compiled defaults.
    pub fn from_env() -> Self {
        Self {
            store_url: env::var(STORE_URL_VAR).ok(),
            database: env::var(DATABASE_VAR).unwrap_or_else(|_| DEFAULT_DATABASE.to_string()),
            collection: env::var(COLLECTION_VAR)
                .unwrap_or_else(|_| DEFAULT_COLLECTION.to_string()),
            model_path: env::var(MODEL_PATH_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_MODEL_PATH)),
            ca_bundle: env::var(CA_BUNDLE_VAR).ok().map(PathBuf::from),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_url: None,
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            ca_bundle: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_every_field() {
        let settings = Settings::default();
        assert!(settings.store_url.is_none());
        assert_eq!(settings.database, "visacast");
        assert_eq!(settings.collection, "applications");
        assert_eq!(settings.model_path, PathBuf::from("artifacts/model.json"));
        assert!(settings.ca_bundle.is_none());
    }
}
