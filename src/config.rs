//! Pipeline Configuration
//!
//! Statically declared input schema, control identifiers and classification
//! options. Loaded from JSON; every field has a default so a partial file
//! (or no file at all) is valid.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};

use crate::error::SchemaError;

/// Where the classifier's thresholds start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OffsetMode {
    /// Thresholds are multiples of the plate SD only
    #[default]
    Zero,
    /// Thresholds are shifted by the plate's negative-control mean
    BaselineMean,
}

/// Input file locations (relative paths resolve against the data directory)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputPaths {
    pub cv_readings: PathBuf,
    pub metadata: PathBuf,
    pub requested_isolates: Option<PathBuf>,
    pub collection: Option<PathBuf>,
}

impl Default for InputPaths {
    fn default() -> Self {
        Self {
            cv_readings: PathBuf::from("cv_readings.xlsx"),
            metadata: PathBuf::from("sample_metadata.tsv"),
            requested_isolates: None,
            collection: None,
        }
    }
}

/// Column names after normalization (see `utils::column_names::clean_name`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadingSchema {
    pub source: String,
    pub plate: String,
    /// Replicate OD columns, in order. The first two feed the negative-control
    /// baseline; all of them are melted for positive-control statistics.
    pub replicates: Vec<String>,
    pub mean: String,
    pub sd: String,
}

impl Default for ReadingSchema {
    fn default() -> Self {
        Self {
            source: "source".to_string(),
            plate: "plate".to_string(),
            replicates: vec!["cv_1".to_string(), "cv_2".to_string()],
            mean: "mean".to_string(),
            sd: "sd".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataSchema {
    pub sample_id: String,
    pub species: String,
    pub serotype: String,
}

impl Default for MetadataSchema {
    fn default() -> Self {
        Self {
            sample_id: "sample_id".to_string(),
            species: "species".to_string(),
            serotype: "serotype".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestedSchema {
    pub sample_id: String,
    pub box_location: String,
}

impl Default for RequestedSchema {
    fn default() -> Self {
        Self {
            sample_id: "sample_id".to_string(),
            box_location: "box_location".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionSchema {
    pub internal_id: String,
}

impl Default for CollectionSchema {
    fn default() -> Self {
        Self { internal_id: "internal_id".to_string() }
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub inputs: InputPaths,
    pub readings: ReadingSchema,
    pub metadata: MetadataSchema,
    pub requested: RequestedSchema,
    pub collection: CollectionSchema,

    /// Source identifier of the negative-control (medium only) wells
    pub negative_control_id: String,
    /// Source prefix identifying the positive-control strain
    pub positive_control_prefix: String,

    pub offset_mode: OffsetMode,
    /// chrono formats tried, in order, on a plate's date token
    pub date_formats: Vec<String>,
    /// Adjusted p-value cutoff for the serotype contrasts table
    pub significance_level: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            inputs: InputPaths::default(),
            readings: ReadingSchema::default(),
            metadata: MetadataSchema::default(),
            requested: RequestedSchema::default(),
            collection: CollectionSchema::default(),
            negative_control_id: "VBE".to_string(),
            positive_control_prefix: "PAO1".to_string(),
            offset_mode: OffsetMode::Zero,
            date_formats: vec![
                "%Y%m%d".to_string(),
                "%Y-%m-%d".to_string(),
                "%d.%m.%Y".to_string(),
            ],
            significance_level: 0.05,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file and validate it
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: PipelineConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config JSON: {:?}", path))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the estimators cannot work with
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.readings.replicates.len() < 2 {
            return Err(SchemaError::TooFewReplicateColumns(self.readings.replicates.len()));
        }
        if self.negative_control_id.trim().is_empty() {
            return Err(SchemaError::EmptyControlId("negative_control_id"));
        }
        if self.positive_control_prefix.trim().is_empty() {
            return Err(SchemaError::EmptyControlId("positive_control_prefix"));
        }
        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return Err(SchemaError::InvalidSignificance(self.significance_level.to_string()));
        }
        Ok(())
    }

    /// Resolve every relative input path against `data_dir`
    pub fn with_data_dir(mut self, data_dir: &Path) -> Self {
        let resolve = |p: &PathBuf| if p.is_absolute() { p.clone() } else { data_dir.join(p) };

        self.inputs.cv_readings = resolve(&self.inputs.cv_readings);
        self.inputs.metadata = resolve(&self.inputs.metadata);
        self.inputs.requested_isolates = self.inputs.requested_isolates.as_ref().map(resolve);
        self.inputs.collection = self.inputs.collection.as_ref().map(resolve);
        self
    }
}
