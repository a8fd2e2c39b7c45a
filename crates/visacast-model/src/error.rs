use std::path::PathBuf;

use thiserror::Error;

type Cause = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("artifact storage failure ({op}): {source}")]
    Storage {
        op: String,
        #[source]
        source: Cause,
    },

    #[error("no model artifact at {0}")]
    ArtifactNotFound(PathBuf),

    #[error("artifact at {path} is not a usable model: {reason}")]
    ArtifactType { path: PathBuf, reason: String },

    #[error("prediction input has no rows")]
    EmptyInput,

    #[error("training input invalid: {0}")]
    Training(String),

    #[error("inference failed: {0}")]
    Inference(String),
}

impl ModelError {
    pub(crate) fn storage(op: impl Into<String>, source: impl Into<Cause>) -> Self {
        Self::Storage {
            op: op.into(),
            source: source.into(),
        }
    }
}
