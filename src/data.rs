//! Data Loading
//!
//! Loads the CV readings sheet, the sample metadata TSV, and the optional
//! requested-isolates and collection sheets. Every cell is read as text,
//! headers are normalized, the declared schema is validated, and rows are
//! converted into typed records.

use polars::prelude::*;
use anyhow::{anyhow, Context, Result};
use std::path::Path;

use crate::config::{CollectionSchema, MetadataSchema, PipelineConfig, ReadingSchema, RequestedSchema};
use crate::error::SchemaError;
use crate::types::{Reading, Replicates, RequestedIsolate, SampleMetadata};
use crate::utils::{
    f64_values, materialize_with_columns, normalize_column_names, normalized_names,
    string_values, PlateLabel,
};

/// All inputs of one report build
#[derive(Debug, Clone)]
pub struct AssayData {
    /// Every CV row, controls included
    pub readings: Vec<Reading>,

    /// Sample metadata (species, serotype)
    pub metadata: Vec<SampleMetadata>,

    /// Isolates requested for the assay, when the sheet is configured
    pub requested: Option<Vec<RequestedIsolate>>,

    /// Internal identifiers of the broader isolate collection, when configured
    pub collection_ids: Option<Vec<String>>,
}

impl AssayData {
    /// Load every configured input; any failure aborts the run
    pub fn load(config: &PipelineConfig) -> Result<Self> {
        tracing::info!("Loading assay inputs...");

        let readings = load_readings(&config.inputs.cv_readings, &config.readings)?;
        let metadata = load_metadata(&config.inputs.metadata, &config.metadata)?;

        let requested = config.inputs.requested_isolates.as_deref()
            .map(|path| load_requested(path, &config.requested))
            .transpose()?;

        let collection_ids = config.inputs.collection.as_deref()
            .map(|path| load_collection(path, &config.collection))
            .transpose()?;

        tracing::info!("  CV readings: {}", readings.len());
        tracing::info!("  Metadata rows: {}", metadata.len());
        if let Some(requested) = &requested {
            tracing::info!("  Requested isolates: {}", requested.len());
        }
        if let Some(ids) = &collection_ids {
            tracing::info!("  Collection isolates: {}", ids.len());
        }

        Ok(Self { readings, metadata, requested, collection_ids })
    }
}

// ============================================================================
// Table readers
// ============================================================================

/// Read a table by file extension, all cells as text, headers normalized
///
/// `.csv` is comma-separated, `.tsv`/`.txt` tab-separated, `.xlsx`/`.xls`
/// reads the first worksheet.
pub fn read_table(path: &Path) -> Result<DataFrame> {
    let ext = path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let mut df = match ext.as_str() {
        "csv" => read_delimited(path, b',')?,
        "tsv" | "txt" => read_delimited(path, b'\t')?,
        "xlsx" | "xls" | "xlsm" => read_workbook(path)?,
        _ => {
            return Err(SchemaError::UnsupportedFormat {
                path: path.display().to_string(),
            }
            .into())
        }
    };

    normalize_column_names(&mut df)?;
    tracing::debug!("Read {:?}: {} rows × {} columns", path, df.height(), df.width());
    Ok(df)
}

fn read_delimited(path: &Path, separator: u8) -> Result<DataFrame> {
    let parse_options = CsvParseOptions::default()
        .with_separator(separator)
        .with_null_values(Some(NullValues::AllColumnsSingle("NA".into())));

    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0)) // Every column as String
        .with_parse_options(parse_options)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("Failed to create CSV reader: {:?}", path))?
        .finish()
        .with_context(|| format!("Failed to parse delimited file: {:?}", path))
}

/// chrono format for workbook cells Excel stores as dates
///
/// Matches the first default entry of `PipelineConfig::date_formats`, so a
/// plate typed as a date still yields a parseable batch date token.
pub const WORKBOOK_DATE_FORMAT: &str = "%Y%m%d";

fn cell_to_string(cell: &calamine::DataType) -> Option<String> {
    use calamine::DataType as Ct;
    match cell {
        Ct::Empty => None,
        Ct::String(s) => Some(s.clone()),
        Ct::Int(i) => Some(i.to_string()),
        // Integral floats are plate dates or ids typed as numbers
        Ct::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => Some(format!("{}", *f as i64)),
        Ct::Float(f) => Some(f.to_string()),
        // Otherwise the Excel serial number would leak through as the label
        Ct::DateTime(_) | Ct::DateTimeIso(_) => Some(
            cell.as_date()
                .map(|d| d.format(WORKBOOK_DATE_FORMAT).to_string())
                .unwrap_or_else(|| cell.to_string()),
        ),
        other => Some(other.to_string()),
    }
}

fn read_workbook(path: &Path) -> Result<DataFrame> {
    use calamine::{open_workbook_auto, Reader};

    let mut wb = open_workbook_auto(path)
        .map_err(|e| anyhow!("Failed to open workbook {:?}: {}", path, e))?;
    let range = wb
        .worksheet_range_at(0)
        .ok_or_else(|| SchemaError::EmptyWorksheet { path: path.display().to_string() })?
        .map_err(|e| anyhow!("Failed to read first worksheet of {:?}: {}", path, e))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or_else(|| SchemaError::EmptyWorksheet { path: path.display().to_string() })?
        .iter()
        .map(|c| cell_to_string(c).unwrap_or_default())
        .collect();

    // Raw headers may repeat; name columns after their normalized form up front
    let names = normalized_names(&headers);
    let mut columns: Vec<Vec<Option<String>>> = vec![Vec::new(); names.len()];

    for row in rows {
        for (idx, values) in columns.iter_mut().enumerate() {
            values.push(row.get(idx).and_then(cell_to_string));
        }
    }

    let series: Vec<Column> = names
        .iter()
        .zip(columns)
        .map(|(name, values)| Series::new(PlSmallStr::from(name.as_str()), values).into())
        .collect();

    DataFrame::new(series).with_context(|| format!("Failed to build DataFrame from {:?}", path))
}

// ============================================================================
// Typed loaders
// ============================================================================

/// Load CV readings; rows lacking a source or plate label are dropped
pub fn load_readings(path: &Path, schema: &ReadingSchema) -> Result<Vec<Reading>> {
    let raw = read_table(path)?;
    readings_from_frame(&raw, schema)
}

pub fn readings_from_frame(raw: &DataFrame, schema: &ReadingSchema) -> Result<Vec<Reading>> {
    let mut required: Vec<&str> = vec![schema.source.as_str(), schema.plate.as_str()];
    required.extend(schema.replicates.iter().map(String::as_str));
    required.push(schema.mean.as_str());
    required.push(schema.sd.as_str());

    let df = materialize_with_columns(raw, &required, "CV readings")?;

    let sources = string_values(&df, &schema.source)?;
    let plates = string_values(&df, &schema.plate)?;
    let means = f64_values(&df, &schema.mean)?;
    let sds = f64_values(&df, &schema.sd)?;
    let replicate_cols: Vec<Vec<Option<f64>>> = schema.replicates
        .iter()
        .map(|name| f64_values(&df, name))
        .collect::<Result<_>>()?;

    let mut readings = Vec::with_capacity(df.height());
    let mut skipped = 0usize;

    for idx in 0..df.height() {
        let (Some(source), Some(plate)) = (&sources[idx], &plates[idx]) else {
            skipped += 1;
            continue;
        };

        let replicates: Replicates = replicate_cols.iter().map(|col| col[idx]).collect();

        readings.push(Reading {
            source: source.clone(),
            plate: PlateLabel::new(plate.as_str()),
            replicates,
            mean_od: means[idx],
            sd_od: sds[idx],
        });
    }

    if skipped > 0 {
        tracing::warn!("CV readings: skipped {} rows without source or plate", skipped);
    }

    Ok(readings)
}

/// Load the sample metadata TSV; rows without a sample id are dropped
pub fn load_metadata(path: &Path, schema: &MetadataSchema) -> Result<Vec<SampleMetadata>> {
    let raw = read_table(path)?;
    let df = materialize_with_columns(
        &raw,
        &[schema.sample_id.as_str(), schema.species.as_str(), schema.serotype.as_str()],
        "sample metadata",
    )?;

    let ids = string_values(&df, &schema.sample_id)?;
    let species = string_values(&df, &schema.species)?;
    let serotypes = string_values(&df, &schema.serotype)?;

    Ok(ids.into_iter()
        .zip(species)
        .zip(serotypes)
        .filter_map(|((id, species), serotype)| {
            id.map(|sample_id| SampleMetadata { sample_id, species, serotype })
        })
        .collect())
}

/// Load the requested-isolates sheet
pub fn load_requested(path: &Path, schema: &RequestedSchema) -> Result<Vec<RequestedIsolate>> {
    let raw = read_table(path)?;
    let df = materialize_with_columns(
        &raw,
        &[schema.sample_id.as_str(), schema.box_location.as_str()],
        "requested isolates",
    )?;

    let ids = string_values(&df, &schema.sample_id)?;
    let boxes = string_values(&df, &schema.box_location)?;

    Ok(ids.into_iter()
        .zip(boxes)
        .filter_map(|(id, box_location)| {
            id.map(|sample_id| RequestedIsolate { sample_id, box_location })
        })
        .collect())
}

/// Load the internal identifiers of the isolate collection
pub fn load_collection(path: &Path, schema: &CollectionSchema) -> Result<Vec<String>> {
    let raw = read_table(path)?;
    let df = materialize_with_columns(&raw, &[schema.internal_id.as_str()], "isolate collection")?;

    Ok(string_values(&df, &schema.internal_id)?
        .into_iter()
        .flatten()
        .collect())
}
