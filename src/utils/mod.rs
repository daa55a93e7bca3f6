//! Utility modules shared by the loaders and the estimators
//!
//! - Column names: header normalization
//! - LazyFrame helpers: projection with column validation, typed extraction
//! - Plate labels: batch keys and date tokens
//! - Stats: summaries with explicit undefined SD
//! - Studentized range: upper-tail probabilities for Tukey HSD

pub mod column_names;
pub mod lazy_helpers;
pub mod plate_label;
pub mod stats;
pub mod studentized_range;

// Re-export commonly used types
pub use column_names::{clean_name, normalized_names, normalize_column_names};
pub use lazy_helpers::{materialize_with_columns, f64_values, string_values};
pub use plate_label::PlateLabel;
pub use stats::{summarize, Summary};
pub use studentized_range::studentized_range_sf;
