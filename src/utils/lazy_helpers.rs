//! DataFrame projection helpers with column validation
//!
//! Inputs are read with every cell as text. These helpers project the
//! declared columns, fail fast when one is absent, and pull typed vectors
//! out of the projected frame.

use polars::prelude::*;
use anyhow::{Context, Result};
use std::collections::HashSet;

use crate::error::SchemaError;

/// Project a DataFrame onto the declared columns, validating presence first
///
/// # Arguments
/// * `df` - Loaded frame (column names already normalized)
/// * `columns` - Required column names
/// * `context` - Context for error messages (e.g., "CV readings")
///
/// # Errors
/// `SchemaError::MissingColumn` for the first declared column not present,
/// with the available columns listed.
///
/// # Example
/// ```rust,ignore
/// let df = materialize_with_columns(&raw, &["source", "plate", "cv_1"], "CV readings")?;
/// ```
pub fn materialize_with_columns(
    df: &DataFrame,
    columns: &[&str],
    context: &str,
) -> Result<DataFrame> {
    let actual_cols: HashSet<String> = df.get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();

    for &expected in columns {
        if !actual_cols.contains(expected) {
            let mut available: Vec<String> = actual_cols.iter().cloned().collect();
            available.sort();
            return Err(SchemaError::MissingColumn {
                context: context.to_string(),
                column: expected.to_string(),
                available,
            }
            .into());
        }
    }

    let col_exprs: Vec<Expr> = columns.iter()
        .map(|&name| col(name))
        .collect();

    df.clone()
        .lazy()
        .select(&col_exprs)
        .collect()
        .with_context(|| format!("{}: Failed to materialize columns {:?}", context, columns))
}

/// Column as optional floats; text that does not parse becomes `None`
pub fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let casted = df.column(name)
        .with_context(|| format!("Column '{}' not found", name))?
        .cast(&DataType::Float64)
        .with_context(|| format!("Column '{}' cannot be cast to Float64", name))?;

    let values = casted.f64()
        .with_context(|| format!("Column '{}' is not Float64 after cast", name))?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect();

    Ok(values)
}

/// Column as optional trimmed strings; blank cells become `None`
pub fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let casted = df.column(name)
        .with_context(|| format!("Column '{}' not found", name))?
        .cast(&DataType::String)
        .with_context(|| format!("Column '{}' cannot be cast to String", name))?;

    let values = casted.str()
        .with_context(|| format!("Column '{}' is not string type", name))?
        .into_iter()
        .map(|v| v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string))
        .collect();

    Ok(values)
}
