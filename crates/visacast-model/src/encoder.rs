//! Feature encoding: tabular columns → fixed-width f32 vectors.
//!
//! Numeric columns are standardized against the mean and deviation observed
//! at fit time; string columns are one-hot encoded over the categories
//! observed at fit time. Missing cells and unseen categories encode to zero,
//! so an inference row with fewer fields than the training frame still
//! produces a full-width vector.

use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};
use visacast_core::frame::{get_f64, get_string};

use crate::ModelError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnEncoding {
    /// Standardize: `(value - mean) / std`. A zero deviation encodes to zero.
    Numeric { mean: f64, std: f64 },
    /// One-hot over the categories seen at fit time, sorted.
    Categorical { values: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureColumn {
    pub name: String,
    pub encoding: ColumnEncoding,
}

/// Per-column encodings fitted on a training frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub columns: Vec<FeatureColumn>,
}

impl FeatureSpec {
    /// Fit encodings from a training batch, skipping `exclude` (the label column).
    pub fn fit(batch: &RecordBatch, exclude: &str) -> Result<Self, ModelError> {
        let mut columns = Vec::new();

        for (idx, field) in batch.schema_ref().fields().iter().enumerate() {
            if field.name() == exclude {
                continue;
            }
            let col = batch.column(idx);

            // A column is numeric when every present cell parses as a number.
            let mut numbers = Vec::new();
            let mut numeric = true;
            for row in 0..batch.num_rows() {
                if col.is_null(row) {
                    continue;
                }
                match get_f64(col.as_ref(), row) {
                    Some(v) => numbers.push(v),
                    None => {
                        numeric = false;
                        break;
                    }
                }
            }

            let encoding = if numeric && !numbers.is_empty() {
                let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;
                let var = numbers.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
                    / numbers.len() as f64;
                ColumnEncoding::Numeric {
                    mean,
                    std: var.sqrt(),
                }
            } else {
                let mut values: Vec<String> = (0..batch.num_rows())
                    .filter_map(|row| get_string(col.as_ref(), row))
                    .collect();
                values.sort();
                values.dedup();
                if values.is_empty() {
                    return Err(ModelError::Training(format!(
                        "column '{}' has no usable values",
                        field.name()
                    )));
                }
                ColumnEncoding::Categorical { values }
            };

            columns.push(FeatureColumn {
                name: field.name().clone(),
                encoding,
            });
        }

        if columns.is_empty() {
            return Err(ModelError::Training(
                "training frame has no feature columns".to_string(),
            ));
        }

        Ok(Self { columns })
    }

    /// Width of the encoded vector.
    pub fn width(&self) -> usize {
        self.columns
            .iter()
            .map(|c| match &c.encoding {
                ColumnEncoding::Numeric { .. } => 1,
                ColumnEncoding::Categorical { values } => values.len(),
            })
            .sum()
    }

    /// Encode one row of a batch. Columns absent from the batch encode to zero.
    pub fn encode_row(&self, batch: &RecordBatch, row: usize) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.width());

        for column in &self.columns {
            let col = batch.column_by_name(&column.name);
            match &column.encoding {
                ColumnEncoding::Numeric { mean, std } => {
                    let value = col.and_then(|c| get_f64(c.as_ref(), row));
                    let encoded = match value {
                        Some(v) if *std > 0.0 => ((v - mean) / std) as f32,
                        _ => 0.0,
                    };
                    out.push(encoded);
                }
                ColumnEncoding::Categorical { values } => {
                    let cell = col.and_then(|c| get_string(c.as_ref(), row));
                    for candidate in values {
                        let hit = cell.as_deref() == Some(candidate.as_str());
                        out.push(if hit { 1.0 } else { 0.0 });
                    }
                }
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use visacast_core::documents_to_batch;

    fn training_batch() -> RecordBatch {
        documents_to_batch(&[
            json!({"continent": "Asia", "wage": 100.0, "case_status": "Certified"}),
            json!({"continent": "Europe", "wage": 200.0, "case_status": "Denied"}),
            json!({"continent": "Asia", "wage": 300.0, "case_status": "Certified"}),
        ])
        .unwrap()
    }

    #[test]
    fn fit_excludes_label_column() {
        let spec = FeatureSpec::fit(&training_batch(), "case_status").unwrap();
        assert!(spec.columns.iter().all(|c| c.name != "case_status"));
        assert_eq!(spec.columns.len(), 2);
    }

    #[test]
    fn fit_detects_numeric_and_categorical() {
        let spec = FeatureSpec::fit(&training_batch(), "case_status").unwrap();
        let wage = spec.columns.iter().find(|c| c.name == "wage").unwrap();
        assert!(matches!(wage.encoding, ColumnEncoding::Numeric { .. }));

        let continent = spec.columns.iter().find(|c| c.name == "continent").unwrap();
        match &continent.encoding {
            ColumnEncoding::Categorical { values } => {
                assert_eq!(values, &["Asia".to_string(), "Europe".to_string()]);
            }
            other => panic!("expected categorical, got {other:?}"),
        }
    }

    #[test]
    fn encode_standardizes_numeric() {
        let batch = training_batch();
        let spec = FeatureSpec::fit(&batch, "case_status").unwrap();
        // wage values 100/200/300: mean 200, so row 1 standardizes to zero.
        let v = spec.encode_row(&batch, 1);
        // Row 1: continent=Europe → [0, 1], wage=200 → 0.
        assert_eq!(v.len(), spec.width());
        let wage_idx = v.len() - 1;
        assert!(v[wage_idx].abs() < 1e-6);
    }

    #[test]
    fn unseen_category_encodes_to_zeros() {
        let batch = training_batch();
        let spec = FeatureSpec::fit(&batch, "case_status").unwrap();

        let row = documents_to_batch(&[json!({"continent": "Oceania", "wage": 200.0})]).unwrap();
        let v = spec.encode_row(&row, 0);
        // continent one-hot slots both zero.
        assert_eq!(&v[..2], &[0.0, 0.0]);
    }

    #[test]
    fn missing_column_encodes_to_zeros() {
        let batch = training_batch();
        let spec = FeatureSpec::fit(&batch, "case_status").unwrap();

        let row = documents_to_batch(&[json!({"wage": 250.0})]).unwrap();
        let v = spec.encode_row(&row, 0);
        assert_eq!(v.len(), spec.width());
        assert_eq!(&v[..2], &[0.0, 0.0]);
    }

    #[test]
    fn numeric_string_cell_still_encodes() {
        let batch = training_batch();
        let spec = FeatureSpec::fit(&batch, "case_status").unwrap();

        // A one-row frame may type wage as Utf8 when it arrives as text.
        let row = documents_to_batch(&[json!({"continent": "Asia", "wage": "200"})]).unwrap();
        let v = spec.encode_row(&row, 0);
        let wage_idx = v.len() - 1;
        assert!(v[wage_idx].abs() < 1e-6);
    }

    #[test]
    fn fit_with_only_label_column_fails() {
        let batch = documents_to_batch(&[json!({"case_status": "Certified"})]).unwrap();
        let result = FeatureSpec::fit(&batch, "case_status");
        assert!(matches!(result, Err(ModelError::Training(_))));
    }
}
