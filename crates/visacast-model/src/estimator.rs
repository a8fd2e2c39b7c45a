//! Artifact lifecycle: presence check, load, save, and lazily cached predict.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{CentroidModel, ModelError};

/// Format tag written into every artifact envelope.
///
/// Load rejects any artifact whose tag differs — the deserialized object must
/// expose this crate's prediction capability, not merely parse as JSON.
pub const ARTIFACT_FORMAT: &str = "visacast/centroid-v1";

#[derive(Debug, Serialize, Deserialize)]
struct ArtifactEnvelope {
    format: String,
    saved_at: DateTime<Utc>,
    model: serde_json::Value,
}

/// Owns one artifact path and an instance-scoped model cache.
///
/// Construction never touches the disk; the cache is populated by the first
/// successful [`predict`](Self::predict) and reused for the instance's
/// lifetime. [`load`](Self::load) stays a pure accessor. Instances are meant
/// to live for one inference session; the cache is not shared across them.
pub struct ModelEstimator {
    path: PathBuf,
    loaded: Option<CentroidModel>,
}

impl ModelEstimator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            loaded: None,
        }
    }

    /// Configured artifact path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether an artifact file exists at the configured path.
    ///
    /// Absence is a normal negative result; only real I/O failures
    /// (permissions etc.) are errors.
    pub fn is_present(&self) -> Result<bool, ModelError> {
        match fs::metadata(&self.path) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ModelError::storage(
                format!("checking artifact at {}", self.path.display()),
                e,
            )),
        }
    }

    /// Deserialize the artifact from disk, validating its format tag.
    ///
    /// Pure accessor: never populates the instance cache (that is predict's
    /// job), so repeated calls have no effect on instance state.
    pub fn load(&self) -> Result<CentroidModel, ModelError> {
        Self::load_from(&self.path)
    }

    fn load_from(path: &Path) -> Result<CentroidModel, ModelError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ModelError::ArtifactNotFound(path.to_path_buf()));
            }
            Err(e) => {
                return Err(ModelError::storage(
                    format!("reading artifact at {}", path.display()),
                    e,
                ));
            }
        };

        let envelope: ArtifactEnvelope =
            serde_json::from_slice(&bytes).map_err(|e| ModelError::ArtifactType {
                path: path.to_path_buf(),
                reason: format!("not a model artifact envelope: {e}"),
            })?;

        if envelope.format != ARTIFACT_FORMAT {
            return Err(ModelError::ArtifactType {
                path: path.to_path_buf(),
                reason: format!(
                    "format '{}' does not match expected '{ARTIFACT_FORMAT}'",
                    envelope.format
                ),
            });
        }

        let model: CentroidModel =
            serde_json::from_value(envelope.model).map_err(|e| ModelError::ArtifactType {
                path: path.to_path_buf(),
                reason: format!("envelope payload is not a centroid model: {e}"),
            })?;

        // Shape-valid JSON can still carry an unusable model; reject it here
        // rather than letting prediction index past a truncated array.
        model.validate().map_err(|reason| ModelError::ArtifactType {
            path: path.to_path_buf(),
            reason: format!("inconsistent centroid model: {reason}"),
        })?;

        debug!(path = %path.display(), saved_at = %envelope.saved_at, "loaded model artifact");
        Ok(model)
    }

    /// Serialize `model` to the configured path, overwriting any prior artifact.
    ///
    /// Creates the parent directory when needed. `remove_source` names a
    /// prior artifact location to delete after — and only after — the write
    /// succeeds; it never refers to the newly written path.
    pub fn save(
        &self,
        model: &CentroidModel,
        remove_source: Option<&Path>,
    ) -> Result<(), ModelError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                ModelError::storage(format!("creating directory {}", parent.display()), e)
            })?;
        }

        let envelope = ArtifactEnvelope {
            format: ARTIFACT_FORMAT.to_string(),
            saved_at: Utc::now(),
            model: serde_json::to_value(model).map_err(|e| {
                ModelError::storage("serializing model artifact".to_string(), e)
            })?,
        };
        let json = serde_json::to_vec_pretty(&envelope)
            .map_err(|e| ModelError::storage("serializing artifact envelope".to_string(), e))?;

        fs::write(&self.path, json).map_err(|e| {
            ModelError::storage(format!("writing artifact to {}", self.path.display()), e)
        })?;
        info!(path = %self.path.display(), "model artifact saved");

        if let Some(prior) = remove_source {
            if prior == self.path {
                // The ambiguous case: deleting the artifact we just wrote is
                // never what the caller wants.
                warn!(path = %self.path.display(), "remove_source equals the artifact path, skipping removal");
            } else {
                fs::remove_file(prior).map_err(|e| {
                    ModelError::storage(
                        format!("removing prior artifact at {}", prior.display()),
                        e,
                    )
                })?;
                debug!(path = %prior.display(), "removed prior artifact");
            }
        }

        Ok(())
    }

    /// Classify every row of `batch`, loading the artifact on first use.
    ///
    /// A zero-row batch fails before any load is attempted. A failed load
    /// leaves the cache empty, so the next call retries. Once a load
    /// succeeds the cached model serves every later call on this instance.
    pub fn predict(&mut self, batch: &RecordBatch) -> Result<Vec<String>, ModelError> {
        if batch.num_rows() == 0 {
            return Err(ModelError::EmptyInput);
        }

        if self.loaded.is_none() {
            debug!(path = %self.path.display(), "no cached model, loading artifact");
            self.loaded = Some(Self::load_from(&self.path)?);
        }
        let model = self
            .loaded
            .as_ref()
            .ok_or_else(|| ModelError::Inference("model cache empty after load".into()))?;

        let labels = model.predict(batch)?;
        if labels.len() != batch.num_rows() {
            return Err(ModelError::Inference(format!(
                "model produced {} labels for {} rows",
                labels.len(),
                batch.num_rows()
            )));
        }
        Ok(labels)
    }
}
