//! Biofilm Pipeline - coordinator for one report build
//!
//! Loads the inputs once, then runs the stages in order:
//!   1. Baseline Estimator (negative controls, per plate)
//!   2. Sample Joiner (metadata + anti-join diagnostics)
//!   3. Biofilm Classifier (each sample against its plate's baseline)
//!   4. Positive-Control Aggregator (per batch + overall, alternate scheme)
//!   5. Serotype ANOVA with pairwise contrasts
//!
//! Every stage result is an immutable value handed to the next stage; no
//! statistic lives outside the returned report.

use anyhow::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analysis::*;
use crate::config::PipelineConfig;
use crate::data::AssayData;
use crate::types::{AltCategory, Category, Sample};
use crate::utils::PlateLabel;

/// Label used in tallies for samples without species or serotype
pub const UNASSIGNED: &str = "unassigned";

/// A sample with both classification calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedSample {
    pub sample_id: String,
    pub plate: PlateLabel,
    pub mean_od: f64,
    pub species: Option<String>,
    pub serotype: Option<String>,
    /// `None` when the plate has no baseline
    pub thresholds: Option<AppliedThresholds>,
    /// `None` when unclassifiable
    pub category: Option<Category>,
    pub alt_category: Option<AltCategory>,
    /// Inside the ±1 SD band of the positive-control scheme
    pub in_inner_band: Option<bool>,
}

/// Category counts of one group of samples
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub non_former: usize,
    pub weak: usize,
    pub moderate: usize,
    pub strong: usize,
    pub unclassifiable: usize,
}

impl CategoryCounts {
    fn add(&mut self, category: Option<Category>) {
        match category {
            Some(Category::NonFormer) => self.non_former += 1,
            Some(Category::Weak) => self.weak += 1,
            Some(Category::Moderate) => self.moderate += 1,
            Some(Category::Strong) => self.strong += 1,
            None => self.unclassifiable += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.non_former + self.weak + self.moderate + self.strong + self.unclassifiable
    }

    pub fn get(&self, category: Option<Category>) -> usize {
        match category {
            Some(Category::NonFormer) => self.non_former,
            Some(Category::Weak) => self.weak,
            Some(Category::Moderate) => self.moderate,
            Some(Category::Strong) => self.strong,
            None => self.unclassifiable,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryTallies {
    pub overall: CategoryCounts,
    pub by_serotype: BTreeMap<String, CategoryCounts>,
    pub by_species: BTreeMap<String, CategoryCounts>,
}

impl CategoryTallies {
    fn from_samples(samples: &[ClassifiedSample]) -> Self {
        let mut tallies = Self::default();
        for s in samples {
            tallies.overall.add(s.category);
            tallies.by_serotype
                .entry(s.serotype.clone().unwrap_or_else(|| UNASSIGNED.to_string()))
                .or_default()
                .add(s.category);
            tallies.by_species
                .entry(s.species.clone().unwrap_or_else(|| UNASSIGNED.to_string()))
                .or_default()
                .add(s.category);
        }
        tallies
    }
}

/// Everything one report build produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub baselines: BaselineTable,
    pub samples: Vec<ClassifiedSample>,
    pub tallies: CategoryTallies,
    pub positive_controls: Option<PositiveControlSummary>,
    pub alternate_thresholds: Option<AlternateThresholds>,
    pub diagnostics: JoinDiagnostics,
    pub serotype_anova: Option<SerotypeAnova>,
    pub significance_level: f64,
    /// Contrasts with adjusted p below the significance level
    pub significant_contrasts: Vec<Contrast>,
}

/// Main pipeline
pub struct BiofilmPipeline {
    config: PipelineConfig,
    data: AssayData,
}

impl BiofilmPipeline {
    /// Validate the configuration and load every input
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let data = AssayData::load(&config)?;
        Ok(Self { config, data })
    }

    /// Pipeline over already loaded data
    pub fn from_data(config: PipelineConfig, data: AssayData) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, data })
    }

    /// Run every stage and assemble the report
    pub fn run(&self) -> PipelineReport {
        let config = &self.config;
        let data = &self.data;

        // STEP 1: Negative-control baselines
        let baselines = estimate_baselines(&data.readings, &config.negative_control_id);

        // STEP 2: Join metadata, collect anti-joins
        let controls = ControlIds {
            negative: &config.negative_control_id,
            positive_prefix: &config.positive_control_prefix,
        };
        let JoinOutcome { samples, diagnostics } = join_samples(
            &data.readings,
            &data.metadata,
            data.requested.as_deref(),
            data.collection_ids.as_deref(),
            controls,
        );

        // STEP 3: Positive-control statistics and alternate thresholds
        let positive_controls = aggregate_positive_controls(
            &data.readings,
            &config.positive_control_prefix,
            &config.date_formats,
        );
        let alternate_thresholds = positive_controls
            .as_ref()
            .and_then(|pc| AlternateThresholds::from_overall(&pc.overall));

        // STEP 4: Classify every sample against its own plate
        let classified = classify_samples(&samples, &baselines, alternate_thresholds.as_ref(), config);
        let tallies = CategoryTallies::from_samples(&classified);

        tracing::info!(
            "Classified {} samples ({} unclassifiable)",
            classified.len(),
            tallies.overall.unclassifiable
        );

        // STEP 5: Serotype comparison
        let serotype_anova = serotype_anova(&samples);
        let significant_contrasts = serotype_anova
            .as_ref()
            .map(|a| a.significant_contrasts(config.significance_level).into_iter().cloned().collect())
            .unwrap_or_default();

        PipelineReport {
            baselines,
            samples: classified,
            tallies,
            positive_controls,
            alternate_thresholds,
            diagnostics,
            serotype_anova,
            significance_level: config.significance_level,
            significant_contrasts,
        }
    }
}

/// Classify samples in parallel; output keeps input order
pub fn classify_samples(
    samples: &[Sample],
    baselines: &BaselineTable,
    alternate: Option<&AlternateThresholds>,
    config: &PipelineConfig,
) -> Vec<ClassifiedSample> {
    samples
        .par_iter()
        .map(|sample| {
            let thresholds = baselines
                .get(&sample.plate)
                .map(|b| AppliedThresholds::from_baseline(b, config.offset_mode));
            let category = thresholds.and_then(|t| t.classify(sample.mean_od));

            ClassifiedSample {
                sample_id: sample.sample_id.clone(),
                plate: sample.plate.clone(),
                mean_od: sample.mean_od,
                species: sample.species.clone(),
                serotype: sample.serotype.clone(),
                thresholds,
                category,
                alt_category: alternate.and_then(|t| t.classify(sample.mean_od)),
                in_inner_band: alternate.map(|t| t.in_inner_band(sample.mean_od)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Reading, SampleMetadata};
    use smallvec::smallvec;

    fn reading(source: &str, plate: &str, cv: [f64; 2], mean_od: Option<f64>) -> Reading {
        Reading {
            source: source.to_string(),
            plate: PlateLabel::new(plate),
            replicates: smallvec![Some(cv[0]), Some(cv[1])],
            mean_od,
            sd_od: None,
        }
    }

    fn data() -> AssayData {
        AssayData {
            readings: vec![
                // Plate a: control values 0.25 and 0.75 → sd = 0.25·√2 ≈ 0.354
                reading("VBE", "20230514a", [0.25, 0.25], Some(0.25)),
                reading("VBE", "20230514a", [0.75, 0.75], Some(0.75)),
                reading("S1", "20230514a", [0.1, 0.1], Some(0.1)),
                reading("S2", "20230514a", [2.0, 2.0], Some(2.0)),
                // Plate b: single control → unclassifiable
                reading("VBE", "20230514b", [0.2, 0.2], Some(0.2)),
                reading("S3", "20230514b", [0.9, 0.9], Some(0.9)),
                // Plate c: no control at all
                reading("S4", "20230601", [0.9, 0.9], Some(0.9)),
                reading("PAO1", "20230514a", [1.0, 1.0], None),
                reading("PAO1", "20230514b", [1.0, 1.0], None),
            ],
            metadata: vec![
                SampleMetadata { sample_id: "S1".into(), species: Some("E. coli".into()), serotype: Some("O6".into()) },
                SampleMetadata { sample_id: "S2".into(), species: Some("E. coli".into()), serotype: Some("O6".into()) },
            ],
            requested: None,
            collection_ids: None,
        }
    }

    #[test]
    fn test_run_classifies_against_own_plate() {
        let pipeline = BiofilmPipeline::from_data(PipelineConfig::default(), data()).unwrap();
        let report = pipeline.run();

        let by_id: BTreeMap<&str, &ClassifiedSample> =
            report.samples.iter().map(|s| (s.sample_id.as_str(), s)).collect();

        assert_eq!(by_id["S1"].category, Some(Category::NonFormer));
        assert_eq!(by_id["S2"].category, Some(Category::Strong));
        assert_eq!(by_id["S3"].category, None);
        assert!(by_id["S3"].thresholds.is_some());
        assert_eq!(by_id["S4"].category, None);
        assert!(by_id["S4"].thresholds.is_none());

        assert_eq!(report.tallies.overall.total(), 4);
        assert_eq!(report.tallies.overall.unclassifiable, 2);
        assert_eq!(report.tallies.by_serotype["O6"].total(), 2);
        assert_eq!(report.tallies.by_serotype[UNASSIGNED].total(), 2);
    }

    #[test]
    fn test_positive_control_constant_gives_zero_sd_thresholds() {
        let pipeline = BiofilmPipeline::from_data(PipelineConfig::default(), data()).unwrap();
        let report = pipeline.run();

        let pc = report.positive_controls.as_ref().unwrap();
        assert_eq!(pc.batches.len(), 1);
        assert_eq!(pc.batches[0].n, 4);
        assert_eq!(pc.batches[0].sd_cv, Some(0.0));

        let t = report.alternate_thresholds.unwrap();
        assert_eq!(t.minus_2sd, 1.0);
        assert_eq!(t.plus_2sd, 1.0);

        let s2 = report.samples.iter().find(|s| s.sample_id == "S2").unwrap();
        assert_eq!(s2.alt_category, Some(AltCategory::Strong));
        assert_eq!(s2.in_inner_band, Some(false));
    }

    #[test]
    fn test_run_twice_is_identical() {
        let pipeline = BiofilmPipeline::from_data(PipelineConfig::default(), data()).unwrap();
        let first = serde_json::to_string(&pipeline.run()).unwrap();
        let second = serde_json::to_string(&pipeline.run()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = PipelineConfig::default();
        config.readings.replicates.truncate(1);
        assert!(BiofilmPipeline::from_data(config, data()).is_err());
    }
}
