//! BASELINE ESTIMATOR: per-plate negative-control (VBE) statistics
//!
//! Each control row contributes one value, the mean of its first two
//! replicate columns. Values are grouped strictly by plate label and
//! summarized into mean, sample SD and count.
//!
//! **Exclusions** (applied before grouping):
//!   - primary replicate missing: row excluded
//!   - secondary replicate missing: row has no defined value, excluded
//!
//! A plate with a single control value gets `sd_vbe = None`. A plate with no
//! control value gets no Baseline at all.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::Reading;
use crate::utils::{summarize, PlateLabel};

/// Negative-control statistics of one plate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub plate: PlateLabel,
    pub mean_vbe: f64,
    /// `None` when the plate has a single control value
    pub sd_vbe: Option<f64>,
    /// Always ≥ 1
    pub n_vbe: usize,
}

/// Baselines keyed by plate label, iterated in label order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BaselineTable(BTreeMap<PlateLabel, Baseline>);

impl BaselineTable {
    /// Baseline of `plate`; `None` when the plate had no control values
    pub fn get(&self, plate: &PlateLabel) -> Option<&Baseline> {
        self.0.get(plate)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Baseline> {
        self.0.values()
    }
}

/// Value a control row contributes: mean of the first two replicates
fn control_value(reading: &Reading) -> Option<f64> {
    let primary = reading.replicates.first().copied().flatten()?;
    let secondary = reading.replicates.get(1).copied().flatten()?;
    Some((primary + secondary) / 2.0)
}

/// Compute one Baseline per plate present in the negative-control subset
///
/// # Arguments
/// * `readings` - All CV readings (controls are selected here)
/// * `negative_control_id` - Source identifier of the control wells
pub fn estimate_baselines(readings: &[Reading], negative_control_id: &str) -> BaselineTable {
    let mut by_plate: BTreeMap<&PlateLabel, Vec<f64>> = BTreeMap::new();
    let mut excluded = 0usize;

    for reading in readings.iter().filter(|r| r.source == negative_control_id) {
        match control_value(reading) {
            Some(value) => by_plate.entry(&reading.plate).or_default().push(value),
            None => excluded += 1,
        }
    }

    if excluded > 0 {
        tracing::warn!(
            "Baseline: excluded {} '{}' rows with a missing replicate",
            excluded, negative_control_id
        );
    }

    // Plates are disjoint; summarize in parallel, re-key into label order
    let baselines: Vec<Baseline> = by_plate
        .into_par_iter()
        .filter_map(|(plate, values)| {
            summarize(&values).map(|s| Baseline {
                plate: plate.clone(),
                mean_vbe: s.mean,
                sd_vbe: s.sd,
                n_vbe: s.n,
            })
        })
        .collect();

    let table: BTreeMap<PlateLabel, Baseline> = baselines
        .into_iter()
        .map(|b| (b.plate.clone(), b))
        .collect();

    tracing::info!("Baseline: {} plates with negative controls", table.len());
    for baseline in table.values().filter(|b| b.sd_vbe.is_none()) {
        tracing::warn!(
            "Baseline: plate {} has a single control value; its samples are unclassifiable",
            baseline.plate
        );
    }

    BaselineTable(table)
}
