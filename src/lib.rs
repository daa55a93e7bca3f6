//! Biofilm Classifier
//!
//! Crystal-violet (CV) biofilm assay analysis: per-plate negative-control
//! baselines, ordinal biofilm categories, positive-control batch statistics
//! with an alternate three-way scheme, and a serotype comparison of mean OD.
//!
//! Layout:
//! - `data`: table loading with Polars (CSV/TSV) and calamine (xlsx)
//! - `analysis/`: the estimators and the classifier, pure over loaded records
//! - `pipeline`: runs the stages in order and assembles a `PipelineReport`
//! - `report/`: JSON and Markdown formatters
//!
//! Plates are never pooled: each sample is judged only against the controls
//! of its own plate.

pub mod config;
pub mod error;
pub mod types;
pub mod utils;
pub mod data;
pub mod analysis;
pub mod pipeline;
pub mod report;

// Re-export commonly used types
pub use config::{OffsetMode, PipelineConfig};
pub use error::SchemaError;
pub use types::{AltCategory, Category, Reading, Sample, SampleMetadata};
pub use data::AssayData;
pub use analysis::*;
pub use pipeline::{BiofilmPipeline, ClassifiedSample, PipelineReport};
pub use report::{JsonFormatter, MarkdownFormatter};
