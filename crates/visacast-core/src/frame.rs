//! Materialization of heterogeneous JSON documents into Arrow RecordBatches.
//!
//! Columns are the union of fields observed across all documents, in sorted
//! order. The store's internal `_id` field is dropped, and the literal token
//! `"na"` is normalized to null. A column whose present cells are all numeric
//! becomes Float64; anything else becomes Utf8.

use std::collections::BTreeSet;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, Float64Array, Float64Builder, LargeStringArray, StringArray, StringBuilder,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use serde_json::Value;
use thiserror::Error;

/// Document-store internal identifier field, stripped on export.
pub const INTERNAL_ID_FIELD: &str = "_id";

/// Literal cell token treated as a missing value.
pub const MISSING_TOKEN: &str = "na";

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("document {index} is not a JSON object")]
    NotAnObject { index: usize },

    #[error("field '{column}' in document {index} is not a scalar value")]
    NonScalarField { column: String, index: usize },

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

/// A scalar cell extracted from a document, before column typing.
enum Cell {
    Number(f64),
    Text(String),
}

/// Materialize a document collection as one RecordBatch.
///
/// An empty collection yields a zero-row, zero-column batch — not an error.
/// Documents with inconsistent field sets get nulls for the fields they lack.
pub fn documents_to_batch(docs: &[Value]) -> Result<RecordBatch, FrameError> {
    // Union of observed fields, sorted for a stable column order.
    let mut columns: BTreeSet<&str> = BTreeSet::new();
    for (index, doc) in docs.iter().enumerate() {
        let obj = doc.as_object().ok_or(FrameError::NotAnObject { index })?;
        for key in obj.keys() {
            if key != INTERNAL_ID_FIELD {
                columns.insert(key.as_str());
            }
        }
    }

    if columns.is_empty() {
        // No exportable fields (empty collection, or documents holding only
        // the internal identifier). Preserve the row count.
        let options = RecordBatchOptions::new().with_row_count(Some(docs.len()));
        let batch =
            RecordBatch::try_new_with_options(Arc::new(Schema::empty()), vec![], &options)?;
        return Ok(batch);
    }

    let mut fields = Vec::with_capacity(columns.len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(columns.len());

    for name in &columns {
        let mut cells: Vec<Option<Cell>> = Vec::with_capacity(docs.len());
        for (index, doc) in docs.iter().enumerate() {
            cells.push(extract_cell(doc, name, index)?);
        }

        let numeric = cells
            .iter()
            .flatten()
            .all(|cell| matches!(cell, Cell::Number(_)));

        let (data_type, array): (DataType, ArrayRef) = if numeric {
            let mut builder = Float64Builder::with_capacity(cells.len());
            for cell in &cells {
                match cell {
                    Some(Cell::Number(v)) => builder.append_value(*v),
                    Some(Cell::Text(_)) => unreachable!("non-numeric cell in numeric column"),
                    None => builder.append_null(),
                }
            }
            (DataType::Float64, Arc::new(builder.finish()))
        } else {
            let mut builder = StringBuilder::new();
            for cell in &cells {
                match cell {
                    Some(Cell::Text(s)) => builder.append_value(s),
                    Some(Cell::Number(v)) => builder.append_value(v.to_string()),
                    None => builder.append_null(),
                }
            }
            (DataType::Utf8, Arc::new(builder.finish()))
        };

        fields.push(Field::new(name.to_string(), data_type, true));
        arrays.push(array);
    }

    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?;
    tracing::debug!(
        rows = batch.num_rows(),
        columns = batch.num_columns(),
        "materialized batch"
    );
    Ok(batch)
}

/// Build a one-row batch from named scalar fields (the inference-request shape).
///
/// Applies the same normalization as a full export: `_id` is dropped and
/// `"na"` becomes null.
pub fn row_from_fields<I>(fields: I) -> Result<RecordBatch, FrameError>
where
    I: IntoIterator<Item = (String, Value)>,
{
    let doc = Value::Object(fields.into_iter().collect());
    documents_to_batch(std::slice::from_ref(&doc))
}

fn extract_cell(doc: &Value, column: &str, index: usize) -> Result<Option<Cell>, FrameError> {
    let Some(value) = doc.get(column) else {
        return Ok(None);
    };
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s == MISSING_TOKEN => Ok(None),
        Value::String(s) => Ok(Some(Cell::Text(s.clone()))),
        Value::Number(n) => match n.as_f64() {
            Some(v) => Ok(Some(Cell::Number(v))),
            // u64 values above f64's exact range keep their decimal form.
            None => Ok(Some(Cell::Text(n.to_string()))),
        },
        Value::Bool(b) => Ok(Some(Cell::Text(b.to_string()))),
        Value::Array(_) | Value::Object(_) => Err(FrameError::NonScalarField {
            column: column.to_string(),
            index,
        }),
    }
}

// ── Cell accessors ──

/// Extract a string value from an Arrow array (handles Utf8 and LargeUtf8).
pub fn get_string(col: &dyn Array, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    col.as_any()
        .downcast_ref::<StringArray>()
        .map(|arr| arr.value(row).to_string())
        .or_else(|| {
            col.as_any()
                .downcast_ref::<LargeStringArray>()
                .map(|arr| arr.value(row).to_string())
        })
}

/// Extract a numeric value from an Arrow array.
///
/// Handles Float64 columns directly and falls back to parsing string cells,
/// so a one-row inference frame typed as Utf8 still yields its numbers.
pub fn get_f64(col: &dyn Array, row: usize) -> Option<f64> {
    if col.is_null(row) {
        return None;
    }
    if let Some(arr) = col.as_any().downcast_ref::<Float64Array>() {
        return Some(arr.value(row));
    }
    get_string(col, row).and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_collection_is_zero_rows_not_error() {
        let batch = documents_to_batch(&[]).unwrap();
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.num_columns(), 0);
    }

    #[test]
    fn internal_id_never_exported() {
        let docs = vec![
            json!({"_id": "6507f1f77bcf86cd799439011", "continent": "Asia"}),
            json!({"_id": "6507f1f77bcf86cd799439012", "continent": "Europe"}),
        ];
        let batch = documents_to_batch(&docs).unwrap();
        assert!(batch.column_by_name("_id").is_none());
        assert!(batch.column_by_name("continent").is_some());
        assert_eq!(batch.num_rows(), 2);
    }

    #[test]
    fn only_id_fields_keeps_row_count() {
        let docs = vec![json!({"_id": "a"}), json!({"_id": "b"})];
        let batch = documents_to_batch(&docs).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 0);
    }

    #[test]
    fn na_token_becomes_null_and_nothing_else_changes() {
        let docs = vec![
            json!({"unit_of_wage": "Hour", "region": "West"}),
            json!({"unit_of_wage": "na", "region": "nah"}),
        ];
        let batch = documents_to_batch(&docs).unwrap();

        let unit = batch.column_by_name("unit_of_wage").unwrap();
        assert_eq!(get_string(unit.as_ref(), 0).as_deref(), Some("Hour"));
        assert!(unit.is_null(1));

        // "nah" is not the missing token and must survive untouched.
        let region = batch.column_by_name("region").unwrap();
        assert_eq!(get_string(region.as_ref(), 1).as_deref(), Some("nah"));
    }

    #[test]
    fn inconsistent_field_sets_get_nulls() {
        let docs = vec![
            json!({"continent": "Asia", "wage": 92000.0}),
            json!({"continent": "Africa"}),
        ];
        let batch = documents_to_batch(&docs).unwrap();
        let wage = batch.column_by_name("wage").unwrap();
        assert_eq!(get_f64(wage.as_ref(), 0), Some(92000.0));
        assert!(wage.is_null(1));
    }

    #[test]
    fn wage_scenario_absent_and_na_normalize_identically() {
        let docs = vec![
            json!({"_id": "1", "wage": 70000.0, "continent": "Asia"}),
            json!({"_id": "2", "continent": "Europe"}),
            json!({"_id": "3", "wage": "na", "continent": "Asia"}),
        ];
        let batch = documents_to_batch(&docs).unwrap();
        assert_eq!(batch.num_rows(), 3);

        let wage = batch.column_by_name("wage").unwrap();
        assert_eq!(get_f64(wage.as_ref(), 0), Some(70000.0));
        assert!(wage.is_null(1));
        assert!(wage.is_null(2));
    }

    #[test]
    fn all_numeric_column_is_float64() {
        let docs = vec![json!({"company_age": 12}), json!({"company_age": 37.5})];
        let batch = documents_to_batch(&docs).unwrap();
        let schema = batch.schema();
        let field = schema.field_with_name("company_age").unwrap();
        assert_eq!(field.data_type(), &DataType::Float64);
    }

    #[test]
    fn mixed_column_falls_back_to_utf8() {
        let docs = vec![
            json!({"no_of_employees": 3500}),
            json!({"no_of_employees": "unknown"}),
        ];
        let batch = documents_to_batch(&docs).unwrap();
        let col = batch.column_by_name("no_of_employees").unwrap();
        assert_eq!(get_string(col.as_ref(), 0).as_deref(), Some("3500"));
        assert_eq!(get_string(col.as_ref(), 1).as_deref(), Some("unknown"));
        // Numeric accessor still parses the stringified number.
        assert_eq!(get_f64(col.as_ref(), 0), Some(3500.0));
    }

    #[test]
    fn numeric_column_with_na_stays_numeric() {
        let docs = vec![json!({"wage": 50000.0}), json!({"wage": "na"})];
        let batch = documents_to_batch(&docs).unwrap();
        let schema = batch.schema();
        let field = schema.field_with_name("wage").unwrap();
        assert_eq!(field.data_type(), &DataType::Float64);
    }

    #[test]
    fn non_object_document_rejected() {
        let docs = vec![json!([1, 2, 3])];
        let result = documents_to_batch(&docs);
        assert!(matches!(result, Err(FrameError::NotAnObject { index: 0 })));
    }

    #[test]
    fn nested_field_rejected() {
        let docs = vec![json!({"employer": {"name": "Acme"}})];
        let result = documents_to_batch(&docs);
        assert!(matches!(
            result,
            Err(FrameError::NonScalarField { ref column, index: 0 }) if column == "employer"
        ));
    }

    #[test]
    fn row_from_fields_builds_one_row() {
        let batch = row_from_fields([
            ("continent".to_string(), json!("Asia")),
            ("prevailing_wage".to_string(), json!(86000.0)),
            ("unit_of_wage".to_string(), json!("na")),
        ])
        .unwrap();

        assert_eq!(batch.num_rows(), 1);
        assert_eq!(batch.num_columns(), 3);
        let unit = batch.column_by_name("unit_of_wage").unwrap();
        assert!(unit.is_null(0));
    }

    #[test]
    fn columns_are_sorted_for_stable_order() {
        let docs = vec![json!({"zeta": 1, "alpha": 2, "mid": 3})];
        let batch = documents_to_batch(&docs).unwrap();
        let schema = batch.schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }
}
