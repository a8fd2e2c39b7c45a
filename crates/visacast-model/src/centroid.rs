//! Nearest-centroid classification over encoded tabular rows.
//!
//! Training computes one centroid per label from L2-normalized feature
//! vectors; prediction encodes a row the same way and returns the label of
//! the highest-cosine-similarity centroid.

use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};
use tracing::info;
use visacast_core::frame::get_string;

use crate::{FeatureSpec, ModelError};

/// A trained nearest-centroid classifier.
///
/// `labels` and `centroids` are parallel; every centroid is unit-norm with
/// the width of `features`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CentroidModel {
    features: FeatureSpec,
    labels: Vec<String>,
    centroids: Vec<Vec<f32>>,
}

impl CentroidModel {
    /// Fit a model from a training batch.
    ///
    /// `label_column` must be a string column; rows with a null label are
    /// skipped. Every other column becomes a feature per [`FeatureSpec::fit`].
    pub fn fit(batch: &RecordBatch, label_column: &str) -> Result<Self, ModelError> {
        if batch.num_rows() == 0 {
            return Err(ModelError::Training("training frame has no rows".into()));
        }
        let label_col = batch.column_by_name(label_column).ok_or_else(|| {
            ModelError::Training(format!("label column '{label_column}' not found"))
        })?;

        let features = FeatureSpec::fit(batch, label_column)?;
        let width = features.width();

        // label → (sum vector, count)
        let mut labels: Vec<String> = Vec::new();
        let mut sums: Vec<(Vec<f32>, usize)> = Vec::new();

        let mut used = 0usize;
        for row in 0..batch.num_rows() {
            let Some(label) = get_string(label_col.as_ref(), row) else {
                continue;
            };

            let mut encoded = features.encode_row(batch, row);
            normalize(&mut encoded);

            let slot = match labels.iter().position(|l| *l == label) {
                Some(i) => i,
                None => {
                    labels.push(label);
                    sums.push((vec![0.0f32; width], 0));
                    sums.len() - 1
                }
            };
            for (acc, v) in sums[slot].0.iter_mut().zip(&encoded) {
                *acc += v;
            }
            sums[slot].1 += 1;
            used += 1;
        }

        if labels.is_empty() {
            return Err(ModelError::Training(format!(
                "label column '{label_column}' has no non-null values"
            )));
        }

        let centroids = sums
            .into_iter()
            .map(|(mut sum, count)| {
                for v in &mut sum {
                    *v /= count as f32;
                }
                normalize(&mut sum);
                sum
            })
            .collect();

        info!(
            labels = labels.len(),
            rows_used = used,
            width,
            "fitted centroid model"
        );
        Ok(Self {
            features,
            labels,
            centroids,
        })
    }

    /// Classify every row of a batch, returning one label per row.
    pub fn predict(&self, batch: &RecordBatch) -> Result<Vec<String>, ModelError> {
        if self.centroids.is_empty() {
            return Err(ModelError::Inference("model has no centroids".into()));
        }

        let mut out = Vec::with_capacity(batch.num_rows());
        for row in 0..batch.num_rows() {
            let mut encoded = self.features.encode_row(batch, row);
            normalize(&mut encoded);
            out.push(self.best_label(&encoded).to_string());
        }
        Ok(out)
    }

    /// Check the internal consistency a hand-edited or corrupt artifact can
    /// violate: labels and centroids must stay parallel, and every centroid
    /// must match the feature width. `fit` always produces a consistent
    /// model; deserialized ones must be checked before use.
    pub fn validate(&self) -> Result<(), String> {
        if self.labels.len() != self.centroids.len() {
            return Err(format!(
                "{} labels for {} centroids",
                self.labels.len(),
                self.centroids.len()
            ));
        }
        let width = self.features.width();
        for (label, centroid) in self.labels.iter().zip(&self.centroids) {
            if centroid.len() != width {
                return Err(format!(
                    "centroid for '{label}' has width {}, expected {width}",
                    centroid.len()
                ));
            }
        }
        Ok(())
    }

    /// Labels this model can produce.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Feature encodings the model was fitted with.
    pub fn features(&self) -> &FeatureSpec {
        &self.features
    }

    fn best_label(&self, encoded: &[f32]) -> &str {
        let mut best = 0;
        let mut best_sim = f32::NEG_INFINITY;
        for (i, centroid) in self.centroids.iter().enumerate() {
            let sim = cosine_sim(encoded, centroid);
            if sim > best_sim {
                best_sim = sim;
                best = i;
            }
        }
        &self.labels[best]
    }
}

/// Dot product of unit vectors.
fn cosine_sim(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// L2-normalize a vector in place.
fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
