//! Column name normalization
//!
//! Spreadsheet headers arrive as "CV 1", "Mean OD", "Sample-ID" and so on.
//! Every loader runs headers through `clean_name` before schema validation so
//! the configured schema only ever names normalized columns.

use polars::prelude::*;
use anyhow::{Context, Result};

/// Lowercase, map non-alphanumerics to `_`, collapse repeats, trim the ends
///
/// "Mean OD (600nm)" → "mean_od_600nm", "CV.1" → "cv_1"
pub fn clean_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_sep = false;

    for ch in raw.trim().chars() {
        if ch.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_sep = true;
        }
    }

    out
}

/// Cleaned names for a header row
///
/// Two headers cleaning to the same name get `_2`, `_3`, … suffixes in order;
/// a header with no alphanumerics becomes `x`.
pub fn normalized_names<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(raw.len());

    for name in raw {
        let base = clean_name(name.as_ref());
        let base = if base.is_empty() { "x".to_string() } else { base };

        let mut candidate = base.clone();
        let mut suffix = 2;
        while seen.contains(&candidate) {
            candidate = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        seen.push(candidate);
    }

    seen
}

/// Rename every column of `df` in place to its normalized name
pub fn normalize_column_names(df: &mut DataFrame) -> Result<()> {
    let raw: Vec<String> = df.get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();

    df.set_column_names(normalized_names(&raw))
        .with_context(|| "Failed to apply normalized column names")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_name() {
        assert_eq!(clean_name("CV 1"), "cv_1");
        assert_eq!(clean_name("CV.1"), "cv_1");
        assert_eq!(clean_name("  Mean OD (600nm) "), "mean_od_600nm");
        assert_eq!(clean_name("Sample-ID"), "sample_id");
        assert_eq!(clean_name("box__location"), "box_location");
        assert_eq!(clean_name("SD"), "sd");
    }

    #[test]
    fn test_normalized_names_blank_header() {
        assert_eq!(normalized_names(&["", "--", "ID"]), vec!["x", "x_2", "id"]);
    }

    #[test]
    fn test_normalize_column_names_dedups() {
        let mut df = df![
            "Source" => &["a"],
            "CV 1" => &["0.1"],
            "cv-1" => &["0.2"],
        ].unwrap();

        normalize_column_names(&mut df).unwrap();

        let names: Vec<String> = df.get_column_names().into_iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["source", "cv_1", "cv_1_2"]);
    }
}
