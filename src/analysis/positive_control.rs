//! POSITIVE-CONTROL AGGREGATOR
//!
//! Statistics of the reference strain's wells, used as an alternate
//! classification baseline.
//!
//! **Per batch** (plates sharing a date token): every replicate value of every
//! positive-control row is melted into one long list, then summarized.
//!
//! **Overall**: the union of all melted values across batches, summarized
//! once. This is not the mean of batch means; batches with more wells weigh
//! more.
//!
//! No matching readings (or no surviving replicate values) yields `None`,
//! which callers must keep distinct from a summary of zeros.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{AltCategory, Reading};
use crate::utils::{summarize, PlateLabel, Summary};

/// Multipliers of the overall SD placed around the overall mean
pub const ALTERNATE_MULTIPLIERS: [f64; 4] = [-2.0, -1.0, 1.0, 2.0];

/// Positive-control statistics of one batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    pub batch: String,
    pub mean_cv: f64,
    pub sd_cv: Option<f64>,
    pub n: usize,
    /// Parsed from the batch's date token; `None` if no format matched
    pub sample_date: Option<NaiveDate>,
}

/// Pooled statistics over every positive-control value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverallStats {
    pub overall_mean: f64,
    pub overall_sd: Option<f64>,
    pub n: usize,
}

impl From<Summary> for OverallStats {
    fn from(s: Summary) -> Self {
        Self { overall_mean: s.mean, overall_sd: s.sd, n: s.n }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositiveControlSummary {
    /// Sorted by batch key
    pub batches: Vec<BatchStats>,
    pub overall: OverallStats,
}

/// Aggregate positive-control readings per batch and overall
///
/// # Arguments
/// * `readings` - All CV readings
/// * `prefix` - Source prefix of the positive-control strain
/// * `date_formats` - chrono formats tried on each batch's date token
pub fn aggregate_positive_controls(
    readings: &[Reading],
    prefix: &str,
    date_formats: &[String],
) -> Option<PositiveControlSummary> {
    let mut by_batch: BTreeMap<&str, (&PlateLabel, Vec<f64>)> = BTreeMap::new();

    for reading in readings.iter().filter(|r| r.source.starts_with(prefix)) {
        let entry = by_batch
            .entry(reading.plate.batch_key())
            .or_insert_with(|| (&reading.plate, Vec::new()));
        entry.1.extend(reading.present_replicates());
    }

    // Pool every melted value in batch order
    let pooled: Vec<f64> = by_batch.values().flat_map(|(_, v)| v.iter().copied()).collect();

    let Some(overall) = summarize(&pooled) else {
        tracing::warn!("Positive control: no replicate values for source prefix '{}'", prefix);
        return None;
    };

    let batches: Vec<BatchStats> = by_batch
        .into_par_iter()
        .filter_map(|(batch, (plate, values))| {
            summarize(&values).map(|s| BatchStats {
                batch: batch.to_string(),
                mean_cv: s.mean,
                sd_cv: s.sd,
                n: s.n,
                sample_date: plate.sample_date(date_formats),
            })
        })
        .collect();

    for b in batches.iter().filter(|b| b.sample_date.is_none()) {
        tracing::warn!("Positive control: batch '{}' has no parseable date token", b.batch);
    }

    tracing::info!(
        "Positive control: {} batches, {} values, overall mean {:.4}",
        batches.len(), overall.n, overall.mean
    );

    Some(PositiveControlSummary { batches, overall: overall.into() })
}

// ============================================================================
// Alternate classification scheme
// ============================================================================

/// Boundaries at overall mean + {-2, -1, +1, +2} · overall SD
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlternateThresholds {
    pub minus_2sd: f64,
    pub minus_1sd: f64,
    pub plus_1sd: f64,
    pub plus_2sd: f64,
}

impl AlternateThresholds {
    /// `None` when the overall SD is undefined
    pub fn from_overall(overall: &OverallStats) -> Option<Self> {
        let sd = overall.overall_sd.filter(|sd| sd.is_finite())?;
        let [m2, m1, p1, p2] = ALTERNATE_MULTIPLIERS.map(|k| overall.overall_mean + k * sd);
        Some(Self { minus_2sd: m2, minus_1sd: m1, plus_1sd: p1, plus_2sd: p2 })
    }

    /// Three-way call on the outer ±2 SD boundaries
    ///
    /// Below the lower bound is weak, above the upper bound strong, anything
    /// in between (bounds inclusive) moderate.
    pub fn classify(&self, od: f64) -> Option<AltCategory> {
        if !od.is_finite() {
            return None;
        }
        let category = if od < self.minus_2sd {
            AltCategory::Weak
        } else if od <= self.plus_2sd {
            AltCategory::Moderate
        } else {
            AltCategory::Strong
        };
        Some(category)
    }

    /// Whether `od` lies strictly inside the ±1 SD band
    ///
    /// The three-way scheme has no rule of its own for this band; it is
    /// flagged in reports rather than resolved.
    pub fn in_inner_band(&self, od: f64) -> bool {
        od > self.minus_1sd && od < self.plus_1sd
    }
}
