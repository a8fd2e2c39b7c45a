use std::path::PathBuf;

use clap::{Parser, Subcommand};
use visacast_core::Settings;

mod commands;

#[derive(Parser)]
#[command(name = "visacast", version, about = "Document export and visa-outcome prediction")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Export a collection from the document store as a table.
    Export {
        /// Collection to export (defaults to the configured collection).
        #[arg(long)]
        collection: Option<String>,
        /// Database override (defaults to the configured database).
        #[arg(long)]
        database: Option<String>,
        /// Write a Parquet file instead of printing to stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Train a nearest-centroid model from a collection and save the artifact.
    Train {
        /// Collection holding labelled training documents.
        #[arg(long)]
        collection: Option<String>,
        /// Database override.
        #[arg(long)]
        database: Option<String>,
        /// Label column name.
        #[arg(long, default_value = "case_status")]
        label: String,
        /// Artifact path override.
        #[arg(long)]
        model: Option<PathBuf>,
        /// Prior artifact to remove after a successful save.
        #[arg(long)]
        remove_prior: Option<PathBuf>,
    },
    /// Predict the outcome for one application described by --field pairs.
    Predict {
        /// Input field as name=value; repeatable.
        #[arg(long = "field", value_parser = commands::parse_field)]
        fields: Vec<(String, String)>,
        /// Artifact path override.
        #[arg(long)]
        model: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    tracing::debug!("visacast v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let settings = Settings::from_env();

    match cli.command {
        Command::Export {
            collection,
            database,
            out,
        } => commands::export(&settings, collection.as_deref(), database.as_deref(), out).await,
        Command::Train {
            collection,
            database,
            label,
            model,
            remove_prior,
        } => {
            commands::train(
                &settings,
                collection.as_deref(),
                database.as_deref(),
                &label,
                model,
                remove_prior,
            )
            .await
        }
        Command::Predict { fields, model } => commands::predict(&settings, &fields, model),
    }
}
