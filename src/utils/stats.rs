//! Descriptive statistics with explicit undefined values
//!
//! Sample standard deviation of a single value is undefined; it is carried
//! as `None` at every layer rather than NaN or 0.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Mean, sample SD and count of a set of values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub mean: f64,
    /// `None` when `n < 2`
    pub sd: Option<f64>,
    pub n: usize,
}

/// Summarize `values`; `None` for an empty slice
///
/// Uses statrs' single-pass mean/variance, which is exact for constant input
/// (variance of `[1.0; 4]` is exactly 0).
pub fn summarize(values: &[f64]) -> Option<Summary> {
    if values.is_empty() {
        return None;
    }

    let mean = values.iter().mean();
    let sd = if values.len() >= 2 {
        let sd = values.iter().std_dev();
        sd.is_finite().then_some(sd)
    } else {
        None
    };

    Some(Summary { mean, sd, n: values.len() })
}
