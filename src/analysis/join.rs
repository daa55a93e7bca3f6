//! SAMPLE JOINER
//!
//! Left-joins metadata onto the non-control readings that have a completed
//! mean OD, and reports every mismatch between the inputs as an explicit
//! anti-join list. Nothing is resolved automatically.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::BTreeSet;

use crate::types::{Reading, RequestedIsolate, Sample, SampleMetadata};

/// Source identifiers that are controls, not samples
#[derive(Debug, Clone, Copy)]
pub struct ControlIds<'a> {
    pub negative: &'a str,
    pub positive_prefix: &'a str,
}

impl ControlIds<'_> {
    pub fn is_control(&self, source: &str) -> bool {
        source == self.negative || source.starts_with(self.positive_prefix)
    }
}

/// Anti-join result sets, each sorted and deduplicated
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JoinDiagnostics {
    /// Non-control readings whose mean OD is blank
    pub readings_without_mean: Vec<String>,
    /// Reading sources absent from the metadata file
    pub readings_without_metadata: Vec<String>,
    /// Metadata ids with no reading at all
    pub metadata_without_readings: Vec<String>,
    /// Metadata ids listed more than once (first row used)
    pub duplicate_metadata_ids: Vec<String>,
    /// Requested isolates that were never measured
    pub requested_not_measured: Vec<String>,
    /// Requested isolates without a freezer box location
    pub requested_without_box_location: Vec<String>,
    /// Reading sources absent from the isolate collection
    pub readings_not_in_collection: Vec<String>,
}

impl JoinDiagnostics {
    pub fn is_clean(&self) -> bool {
        self.readings_without_mean.is_empty()
            && self.readings_without_metadata.is_empty()
            && self.metadata_without_readings.is_empty()
            && self.duplicate_metadata_ids.is_empty()
            && self.requested_not_measured.is_empty()
            && self.requested_without_box_location.is_empty()
            && self.readings_not_in_collection.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinOutcome {
    /// Sorted by sample id, then plate
    pub samples: Vec<Sample>,
    pub diagnostics: JoinDiagnostics,
}

fn sorted<'a>(ids: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    ids.into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Join metadata onto readings and collect the anti-join sets
///
/// `requested` and `collection_ids` are optional inputs; when absent their
/// diagnostics stay empty.
pub fn join_samples(
    readings: &[Reading],
    metadata: &[SampleMetadata],
    requested: Option<&[RequestedIsolate]>,
    collection_ids: Option<&[String]>,
    controls: ControlIds<'_>,
) -> JoinOutcome {
    let mut diagnostics = JoinDiagnostics::default();

    // First metadata row per id wins
    let mut meta_by_id: FxHashMap<&str, &SampleMetadata> = FxHashMap::default();
    let mut duplicates: Vec<&str> = Vec::new();
    for row in metadata {
        match meta_by_id.entry(row.sample_id.as_str()) {
            Entry::Occupied(_) => duplicates.push(row.sample_id.as_str()),
            Entry::Vacant(slot) => {
                slot.insert(row);
            }
        }
    }
    diagnostics.duplicate_metadata_ids = sorted(duplicates);

    let sample_readings: Vec<&Reading> = readings
        .iter()
        .filter(|r| !controls.is_control(&r.source))
        .collect();
    let measured: FxHashSet<&str> = sample_readings.iter().map(|r| r.source.as_str()).collect();

    let mut samples = Vec::with_capacity(sample_readings.len());
    let mut without_mean = Vec::new();
    let mut without_metadata = Vec::new();

    for reading in &sample_readings {
        let meta = meta_by_id.get(reading.source.as_str());
        if meta.is_none() {
            without_metadata.push(reading.source.as_str());
        }

        let Some(mean_od) = reading.mean_od else {
            without_mean.push(reading.source.as_str());
            continue;
        };

        samples.push(Sample {
            sample_id: reading.source.clone(),
            plate: reading.plate.clone(),
            mean_od,
            species: meta.and_then(|m| m.species.clone()),
            serotype: meta.and_then(|m| m.serotype.clone()),
        });
    }

    samples.sort_by(|a, b| a.sample_id.cmp(&b.sample_id).then_with(|| a.plate.cmp(&b.plate)));

    diagnostics.readings_without_mean = sorted(without_mean);
    diagnostics.readings_without_metadata = sorted(without_metadata);
    diagnostics.metadata_without_readings = sorted(
        meta_by_id.keys().copied().filter(|id| !measured.contains(id)),
    );

    if let Some(requested) = requested {
        diagnostics.requested_not_measured = sorted(
            requested
                .iter()
                .map(|r| r.sample_id.as_str())
                .filter(|id| !measured.contains(id)),
        );
        diagnostics.requested_without_box_location = sorted(
            requested
                .iter()
                .filter(|r| r.box_location.is_none())
                .map(|r| r.sample_id.as_str()),
        );
    }

    if let Some(collection_ids) = collection_ids {
        let collection: FxHashSet<&str> = collection_ids.iter().map(String::as_str).collect();
        diagnostics.readings_not_in_collection = sorted(
            measured.iter().copied().filter(|id| !collection.contains(id)),
        );
    }

    log_diagnostics(&diagnostics);

    JoinOutcome { samples, diagnostics }
}

fn log_diagnostics(d: &JoinDiagnostics) {
    let sets: [(&str, &Vec<String>); 7] = [
        ("readings without mean OD", &d.readings_without_mean),
        ("readings without metadata", &d.readings_without_metadata),
        ("metadata without readings", &d.metadata_without_readings),
        ("duplicate metadata ids", &d.duplicate_metadata_ids),
        ("requested isolates not measured", &d.requested_not_measured),
        ("requested isolates without box location", &d.requested_without_box_location),
        ("readings not in collection", &d.readings_not_in_collection),
    ];

    for (label, ids) in sets {
        if !ids.is_empty() {
            tracing::warn!("Join: {} {}: {:?}", ids.len(), label, ids);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::PlateLabel;
    use smallvec::smallvec;

    const CONTROLS: ControlIds<'static> = ControlIds { negative: "VBE", positive_prefix: "PAO1" };

    fn reading(source: &str, mean_od: Option<f64>) -> Reading {
        Reading {
            source: source.to_string(),
            plate: PlateLabel::new("20230514"),
            replicates: smallvec![mean_od, mean_od],
            mean_od,
            sd_od: Some(0.0),
        }
    }

    fn meta(id: &str, serotype: Option<&str>) -> SampleMetadata {
        SampleMetadata {
            sample_id: id.to_string(),
            species: Some("E. coli".to_string()),
            serotype: serotype.map(str::to_string),
        }
    }

    #[test]
    fn test_join_keeps_completed_means_and_excludes_controls() {
        let readings = vec![
            reading("S2", Some(0.5)),
            reading("VBE", Some(0.1)),
            reading("PAO1", Some(2.0)),
            reading("S1", Some(0.3)),
            reading("S3", None),
        ];
        let metadata = vec![meta("S1", Some("O6")), meta("S2", None), meta("S3", Some("O1"))];

        let outcome = join_samples(&readings, &metadata, None, None, CONTROLS);

        let ids: Vec<&str> = outcome.samples.iter().map(|s| s.sample_id.as_str()).collect();
        assert_eq!(ids, vec!["S1", "S2"]);
        assert_eq!(outcome.samples[0].serotype.as_deref(), Some("O6"));
        assert_eq!(outcome.samples[1].serotype, None);
        assert_eq!(outcome.diagnostics.readings_without_mean, vec!["S3"]);
        assert!(outcome.diagnostics.readings_without_metadata.is_empty());
    }

    #[test]
    fn test_anti_joins_surface_mismatches() {
        let readings = vec![reading("S1", Some(0.3)), reading("S9", Some(0.4))];
        let metadata = vec![meta("S1", Some("O6")), meta("S5", None), meta("S1", Some("O25"))];
        let requested = vec![
            RequestedIsolate { sample_id: "S1".to_string(), box_location: Some("B2".to_string()) },
            RequestedIsolate { sample_id: "S7".to_string(), box_location: None },
        ];
        let collection = vec!["S1".to_string(), "S5".to_string()];

        let outcome = join_samples(
            &readings,
            &metadata,
            Some(requested.as_slice()),
            Some(collection.as_slice()),
            CONTROLS,
        );
        let d = &outcome.diagnostics;

        assert_eq!(d.readings_without_metadata, vec!["S9"]);
        assert_eq!(d.metadata_without_readings, vec!["S5"]);
        assert_eq!(d.duplicate_metadata_ids, vec!["S1"]);
        assert_eq!(d.requested_not_measured, vec!["S7"]);
        assert_eq!(d.requested_without_box_location, vec!["S7"]);
        assert_eq!(d.readings_not_in_collection, vec!["S9"]);
        assert!(!d.is_clean());

        // Unmatched readings are kept, not dropped
        assert_eq!(outcome.samples.len(), 2);
        // First duplicate metadata row wins
        assert_eq!(outcome.samples[0].serotype.as_deref(), Some("O6"));
    }

    #[test]
    fn test_clean_join() {
        let readings = vec![reading("S1", Some(0.3))];
        let metadata = vec![meta("S1", Some("O6"))];
        let outcome = join_samples(&readings, &metadata, None, None, CONTROLS);
        assert!(outcome.diagnostics.is_clean());
    }
}
