//! Command implementations: export, train, predict.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Context;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde_json::Value;
use visacast_core::{Settings, row_from_fields};
use visacast_model::{CentroidModel, ModelEstimator};
use visacast_store::ConnectionProvider;

/// Parse a `name=value` argument.
pub fn parse_field(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected name=value, got '{s}'"))
}

async fn fetch_batch(
    settings: &Settings,
    collection: Option<&str>,
    database: Option<&str>,
) -> anyhow::Result<RecordBatch> {
    let provider = ConnectionProvider::new(settings.clone());
    let collection = collection.unwrap_or(&settings.collection);
    let batch = provider
        .export_collection(collection, database)
        .await
        .with_context(|| format!("exporting collection '{collection}'"))?;
    Ok(batch)
}

pub async fn export(
    settings: &Settings,
    collection: Option<&str>,
    database: Option<&str>,
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let batch = fetch_batch(settings, collection, database).await?;

    match out {
        Some(path) => {
            write_parquet(&batch, &path)?;
            eprintln!("Wrote {} rows to {}", batch.num_rows(), path.display());
        }
        None => {
            arrow::util::pretty::print_batches(&[batch]).context("printing table")?;
        }
    }
    Ok(())
}

fn write_parquet(batch: &RecordBatch, path: &Path) -> anyhow::Result<()> {
    let file =
        File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer =
        ArrowWriter::try_new(file, batch.schema(), None).context("opening parquet writer")?;
    writer.write(batch).context("writing parquet")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

pub async fn train(
    settings: &Settings,
    collection: Option<&str>,
    database: Option<&str>,
    label: &str,
    model_path: Option<PathBuf>,
    remove_prior: Option<PathBuf>,
) -> anyhow::Result<()> {
    let batch = fetch_batch(settings, collection, database).await?;
    let model = CentroidModel::fit(&batch, label).context("fitting model")?;

    let path = model_path.unwrap_or_else(|| settings.model_path.clone());
    let estimator = ModelEstimator::new(&path);
    estimator
        .save(&model, remove_prior.as_deref())
        .context("saving model artifact")?;

    eprintln!(
        "Trained on {} rows ({} labels), artifact at {}",
        batch.num_rows(),
        model.labels().len(),
        path.display()
    );
    Ok(())
}

pub fn predict(
    settings: &Settings,
    fields: &[(String, String)],
    model_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    anyhow::ensure!(!fields.is_empty(), "at least one --field is required");

    let row = row_from_fields(fields.iter().map(|(k, v)| (k.clone(), parse_value(v))))
        .context("building input row")?;

    let path = model_path.unwrap_or_else(|| settings.model_path.clone());
    let mut estimator = ModelEstimator::new(path);
    let labels = estimator.predict(&row).context("predicting")?;

    // Exactly one row in, exactly one label out.
    let label = labels
        .first()
        .ok_or_else(|| anyhow::anyhow!("model returned no label"))?;
    println!("{label}");
    Ok(())
}

/// Interpret a CLI field value: numbers become JSON numbers, the rest strings.
/// The missing-value token passes through for the frame layer to normalize.
fn parse_value(raw: &str) -> Value {
    match raw.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(raw.to_string())),
        _ => Value::String(raw.to_string()),
    }
}
