//! Core record types
//!
//! Rows are converted from DataFrames into these once at load time; every
//! estimator works on slices of them.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::utils::PlateLabel;

/// Replicate OD values of one well group, in declared column order
pub type Replicates = SmallVec<[Option<f64>; 4]>;

/// One CV measurement row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub source: String,
    pub plate: PlateLabel,
    pub replicates: Replicates,
    /// Precomputed mean OD across replicates (blank until the row is complete)
    pub mean_od: Option<f64>,
    pub sd_od: Option<f64>,
}

impl Reading {
    /// Non-missing replicate values, in column order
    pub fn present_replicates(&self) -> impl Iterator<Item = f64> + '_ {
        self.replicates.iter().filter_map(|v| *v)
    }
}

/// One row of the sample metadata TSV
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleMetadata {
    pub sample_id: String,
    pub species: Option<String>,
    pub serotype: Option<String>,
}

/// One row of the requested-isolates sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestedIsolate {
    pub sample_id: String,
    pub box_location: Option<String>,
}

/// A joined, classifiable sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub sample_id: String,
    pub plate: PlateLabel,
    pub mean_od: f64,
    pub species: Option<String>,
    pub serotype: Option<String>,
}

/// Biofilm-formation category against the negative-control baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "non-former")]
    NonFormer,
    #[serde(rename = "weak")]
    Weak,
    #[serde(rename = "moderate")]
    Moderate,
    #[serde(rename = "strong")]
    Strong,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::NonFormer,
        Category::Weak,
        Category::Moderate,
        Category::Strong,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::NonFormer => "non-former",
            Category::Weak => "weak",
            Category::Moderate => "moderate",
            Category::Strong => "strong",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category under the positive-control scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AltCategory {
    Weak,
    Moderate,
    Strong,
}

impl AltCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AltCategory::Weak => "weak",
            AltCategory::Moderate => "moderate",
            AltCategory::Strong => "strong",
        }
    }
}

impl fmt::Display for AltCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn test_category_order_is_ordinal() {
        assert!(Category::NonFormer < Category::Weak);
        assert!(Category::Weak < Category::Moderate);
        assert!(Category::Moderate < Category::Strong);
        assert!(AltCategory::Weak < AltCategory::Strong);
    }

    #[test]
    fn test_category_serde_labels() {
        assert_eq!(serde_json::to_string(&Category::NonFormer).unwrap(), "\"non-former\"");
        assert_eq!(serde_json::to_string(&AltCategory::Moderate).unwrap(), "\"moderate\"");
        let parsed: Category = serde_json::from_str("\"strong\"").unwrap();
        assert_eq!(parsed, Category::Strong);
    }

    #[test]
    fn test_present_replicates_skips_missing() {
        let reading = Reading {
            source: "S1".to_string(),
            plate: PlateLabel::new("20230514"),
            replicates: smallvec![Some(0.2), None, Some(0.4)],
            mean_od: Some(0.3),
            sd_od: None,
        };
        let values: Vec<f64> = reading.present_replicates().collect();
        assert_eq!(values, vec![0.2, 0.4]);
    }
}
