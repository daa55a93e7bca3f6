// Biofilm report binary
//
// Loads the assay inputs, runs the pipeline, and writes report.json and
// report.md to OUTPUT_DIR.
//
// Environment:
//   BIOFILM_CONFIG  JSON config file (optional; defaults otherwise)
//   DATA_DIR        base directory for relative input paths (default: data)
//   OUTPUT_DIR      report directory (default: output)
//   RUST_LOG        tracing filter

use anyhow::Context;
use biofilm_classifier::{BiofilmPipeline, JsonFormatter, MarkdownFormatter, PipelineConfig};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "biofilm_classifier=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let data_dir = PathBuf::from(std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()));
    let output_dir = PathBuf::from(std::env::var("OUTPUT_DIR").unwrap_or_else(|_| "output".to_string()));
    let config_path = std::env::var("BIOFILM_CONFIG").ok().map(PathBuf::from);

    tracing::info!("Configuration:");
    tracing::info!("  DATA_DIR: {}", data_dir.display());
    tracing::info!("  OUTPUT_DIR: {}", output_dir.display());
    tracing::info!("  BIOFILM_CONFIG: {:?}", config_path);

    let config = match &config_path {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    }
    .with_data_dir(&data_dir);

    let start = Instant::now();
    let pipeline = BiofilmPipeline::new(config)?;
    let report = pipeline.run();
    tracing::info!("Pipeline finished in {:.2?}", start.elapsed());

    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    let json_path = output_dir.join("report.json");
    fs::write(&json_path, JsonFormatter::format(&report)?)
        .with_context(|| format!("Failed to write {:?}", json_path))?;

    let md_path = output_dir.join("report.md");
    fs::write(&md_path, MarkdownFormatter::format(&report))
        .with_context(|| format!("Failed to write {:?}", md_path))?;

    tracing::info!("Wrote {} and {}", json_path.display(), md_path.display());
    if !report.diagnostics.is_clean() {
        tracing::warn!("Input mismatches found; see the Data Issues section of report.md");
    }

    Ok(())
}
