//! BIOFILM CLASSIFIER
//!
//! Maps a mean OD reading onto an ordinal biofilm category using multiples of
//! the plate's negative-control SD:
//!
//! | Range                                  | Category   |
//! |----------------------------------------|------------|
//! | od < offset + 1·sd                     | non-former |
//! | offset + 1·sd ≤ od ≤ offset + 2·sd     | weak       |
//! | offset + 2·sd ≤ od ≤ offset + 4·sd     | moderate   |
//! | od > offset + 4·sd                     | strong     |
//!
//! Adjacent ranges share their boundary. Rules are tested in table order and
//! the first match wins: `od == offset + 2·sd` is weak, `od == offset + 4·sd`
//! is moderate.

use serde::{Deserialize, Serialize};

use crate::analysis::baseline::Baseline;
use crate::config::OffsetMode;
use crate::types::Category;

/// SD multipliers of the category boundaries
pub const WEAK_MULTIPLIER: f64 = 1.0;
pub const MODERATE_MULTIPLIER: f64 = 2.0;
pub const STRONG_MULTIPLIER: f64 = 4.0;

/// Classify `od` against a baseline SD, thresholds shifted by `offset`
///
/// Returns `None` (unclassifiable) when `baseline_sd` is undefined or when
/// either input is not finite.
pub fn classify(od: f64, baseline_sd: Option<f64>, offset: f64) -> Option<Category> {
    let sd = baseline_sd?;
    if !od.is_finite() || !sd.is_finite() || !offset.is_finite() {
        return None;
    }

    let weak = offset + WEAK_MULTIPLIER * sd;
    let moderate = offset + MODERATE_MULTIPLIER * sd;
    let strong = offset + STRONG_MULTIPLIER * sd;

    let category = if od < weak {
        Category::NonFormer
    } else if od <= moderate {
        Category::Weak
    } else if od <= strong {
        Category::Moderate
    } else {
        Category::Strong
    };

    Some(category)
}

/// Thresholds the classifier applied to one sample, kept for the report
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AppliedThresholds {
    pub offset: f64,
    pub sd: Option<f64>,
}

impl AppliedThresholds {
    pub fn from_baseline(baseline: &Baseline, mode: OffsetMode) -> Self {
        let offset = match mode {
            OffsetMode::Zero => 0.0,
            OffsetMode::BaselineMean => baseline.mean_vbe,
        };
        Self { offset, sd: baseline.sd_vbe }
    }

    pub fn classify(&self, od: f64) -> Option<Category> {
        classify(od, self.sd, self.offset)
    }
}
