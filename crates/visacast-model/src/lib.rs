//! Model lifecycle: artifact persistence, lazy loading, and inference.

mod centroid;
mod encoder;
mod error;
mod estimator;

pub use centroid::CentroidModel;
pub use encoder::{ColumnEncoding, FeatureColumn, FeatureSpec};
pub use error::ModelError;
pub use estimator::{ARTIFACT_FORMAT, ModelEstimator};
