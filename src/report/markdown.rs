use std::collections::BTreeMap;

use crate::pipeline::{CategoryCounts, PipelineReport};
use crate::types::Category;

/// Placeholder for undefined statistics
const NA: &str = "NA";

/// Markdown formatter for pipeline reports
pub struct MarkdownFormatter;

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| NA.to_string(), |v| format!("{:.4}", v))
}

fn fmt_label<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| NA.to_string(), |v| v.to_string())
}

impl MarkdownFormatter {
    /// Format report as markdown
    pub fn format(report: &PipelineReport) -> String {
        let mut md = String::with_capacity(4096);

        md.push_str("# Biofilm Formation Report\n\n");
        md.push_str(&format!(
            "**Samples classified:** {} of {}\n\n",
            report.tallies.overall.total() - report.tallies.overall.unclassifiable,
            report.tallies.overall.total()
        ));

        Self::format_baselines(&mut md, report);
        Self::format_tallies(&mut md, report);
        Self::format_samples(&mut md, report);
        Self::format_positive_controls(&mut md, report);
        Self::format_serotype_anova(&mut md, report);
        Self::format_diagnostics(&mut md, report);

        md
    }

    fn format_baselines(md: &mut String, report: &PipelineReport) {
        md.push_str("## Negative-Control Baselines\n\n");
        if report.baselines.is_empty() {
            md.push_str("No plate has negative-control readings.\n\n");
            return;
        }
        md.push_str("| Plate | Mean | SD | n |\n");
        md.push_str("|-------|------|----|---|\n");
        for b in report.baselines.iter() {
            md.push_str(&format!(
                "| {} | {:.4} | {} | {} |\n",
                b.plate, b.mean_vbe, fmt_opt(b.sd_vbe), b.n_vbe
            ));
        }
        md.push('\n');
    }

    fn format_tallies(md: &mut String, report: &PipelineReport) {
        md.push_str("## Categories\n\n");
        Self::format_count_table(md, "Group", &BTreeMap::from([("all".to_string(), report.tallies.overall.clone())]));

        md.push_str("### By Serotype\n\n");
        Self::format_count_table(md, "Serotype", &report.tallies.by_serotype);

        md.push_str("### By Species\n\n");
        Self::format_count_table(md, "Species", &report.tallies.by_species);
    }

    fn format_count_table(md: &mut String, key: &str, rows: &BTreeMap<String, CategoryCounts>) {
        md.push_str(&format!("| {} |", key));
        for category in Category::ALL {
            md.push_str(&format!(" {} |", category));
        }
        md.push_str(" unclassifiable | total |\n");
        md.push_str(&format!("|{}|\n", vec!["---"; Category::ALL.len() + 3].join("|")));

        for (name, counts) in rows {
            md.push_str(&format!("| {} |", name));
            for category in Category::ALL {
                md.push_str(&format!(" {} |", counts.get(Some(category))));
            }
            md.push_str(&format!(" {} | {} |\n", counts.unclassifiable, counts.total()));
        }
        md.push('\n');
    }

    fn format_samples(md: &mut String, report: &PipelineReport) {
        md.push_str("## Samples\n\n");
        if report.samples.is_empty() {
            md.push_str("No samples.\n\n");
            return;
        }
        md.push_str("| Sample | Plate | Serotype | Mean OD | Baseline SD | Category | Positive-control scheme | Inner band |\n");
        md.push_str("|--------|-------|----------|---------|-------------|----------|-------------------------|------------|\n");
        for s in &report.samples {
            md.push_str(&format!(
                "| {} | {} | {} | {:.4} | {} | {} | {} | {} |\n",
                s.sample_id,
                s.plate,
                s.serotype.as_deref().unwrap_or(NA),
                s.mean_od,
                fmt_opt(s.thresholds.and_then(|t| t.sd)),
                fmt_label(s.category),
                fmt_label(s.alt_category),
                match s.in_inner_band {
                    Some(true) => "yes",
                    Some(false) => "no",
                    None => NA,
                },
            ));
        }
        md.push('\n');
    }

    fn format_positive_controls(md: &mut String, report: &PipelineReport) {
        md.push_str("## Positive Control\n\n");
        let Some(pc) = &report.positive_controls else {
            md.push_str("No positive-control readings.\n\n");
            return;
        };

        md.push_str("| Batch | Date | Mean CV | SD CV | n |\n");
        md.push_str("|-------|------|---------|-------|---|\n");
        for b in &pc.batches {
            md.push_str(&format!(
                "| {} | {} | {:.4} | {} | {} |\n",
                b.batch,
                fmt_label(b.sample_date),
                b.mean_cv,
                fmt_opt(b.sd_cv),
                b.n
            ));
        }
        md.push_str(&format!(
            "\n**Overall:** mean {:.4}, SD {}, n = {}\n\n",
            pc.overall.overall_mean,
            fmt_opt(pc.overall.overall_sd),
            pc.overall.n
        ));

        if let Some(t) = &report.alternate_thresholds {
            md.push_str(&format!(
                "**Thresholds:** -2SD {:.4} | -1SD {:.4} | +1SD {:.4} | +2SD {:.4}\n\n",
                t.minus_2sd, t.minus_1sd, t.plus_1sd, t.plus_2sd
            ));
        }
    }

    fn format_serotype_anova(md: &mut String, report: &PipelineReport) {
        md.push_str("## Serotype Comparison\n\n");
        let Some(anova) = &report.serotype_anova else {
            md.push_str("Not enough serotypes with repeated samples for a test.\n\n");
            return;
        };

        md.push_str(&format!(
            "One-way ANOVA: F({}, {}) = {:.3}, p = {:.4}\n\n",
            anova.df_between, anova.df_within, anova.f_statistic, anova.p_value
        ));

        md.push_str("| Serotype | n | Mean OD | SD |\n");
        md.push_str("|----------|---|---------|----|\n");
        for g in &anova.groups {
            md.push_str(&format!("| {} | {} | {:.4} | {} |\n", g.serotype, g.n, g.mean_od, fmt_opt(g.sd_od)));
        }
        md.push('\n');

        if report.significant_contrasts.is_empty() {
            md.push_str(&format!(
                "No pairwise contrast significant at α = {}.\n\n",
                report.significance_level
            ));
        } else {
            md.push_str(&format!("### Significant Contrasts (α = {})\n\n", report.significance_level));
            md.push_str("| Contrast | Difference | q | p (Tukey) |\n");
            md.push_str("|----------|------------|---|----------|\n");
            for c in &report.significant_contrasts {
                md.push_str(&format!(
                    "| {} | {:.4} | {:.4} | {:.4} |\n",
                    c.label, c.difference, c.q_statistic, c.p_adjusted
                ));
            }
            md.push('\n');
        }
    }

    fn format_diagnostics(md: &mut String, report: &PipelineReport) {
        md.push_str("## Data Issues\n\n");
        let d = &report.diagnostics;
        if d.is_clean() {
            md.push_str("✅ All inputs matched.\n\n");
            return;
        }

        let sets: [(&str, &Vec<String>); 7] = [
            ("Readings without mean OD", &d.readings_without_mean),
            ("Readings without metadata", &d.readings_without_metadata),
            ("Metadata without readings", &d.metadata_without_readings),
            ("Duplicate metadata ids", &d.duplicate_metadata_ids),
            ("Requested isolates not measured", &d.requested_not_measured),
            ("Requested isolates without box location", &d.requested_without_box_location),
            ("Readings not in collection", &d.readings_not_in_collection),
        ];
        for (label, ids) in sets.iter().filter(|(_, ids)| !ids.is_empty()) {
            md.push_str(&format!("- ⚠️ **{}** ({}): {}\n", label, ids.len(), ids.join(", ")));
        }
        md.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AppliedThresholds, JoinDiagnostics};
    use crate::pipeline::{CategoryTallies, ClassifiedSample};
    use crate::utils::PlateLabel;

    fn report() -> PipelineReport {
        let samples = vec![
            ClassifiedSample {
                sample_id: "S1".to_string(),
                plate: PlateLabel::new("20230514a"),
                mean_od: 0.9,
                species: Some("E. coli".to_string()),
                serotype: Some("O6".to_string()),
                thresholds: Some(AppliedThresholds { offset: 0.0, sd: Some(0.1) }),
                category: Some(Category::Strong),
                alt_category: None,
                in_inner_band: None,
            },
            ClassifiedSample {
                sample_id: "S2".to_string(),
                plate: PlateLabel::new("20230601"),
                mean_od: 0.2,
                species: None,
                serotype: None,
                thresholds: None,
                category: None,
                alt_category: None,
                in_inner_band: None,
            },
        ];
        let mut tallies = CategoryTallies::default();
        tallies.overall.strong = 1;
        tallies.overall.unclassifiable = 1;

        PipelineReport {
            baselines: Default::default(),
            samples,
            tallies,
            positive_controls: None,
            alternate_thresholds: None,
            diagnostics: JoinDiagnostics {
                readings_without_metadata: vec!["S2".to_string()],
                ..Default::default()
            },
            serotype_anova: None,
            significance_level: 0.05,
            significant_contrasts: vec![],
        }
    }

    #[test]
    fn test_format_markdown() {
        let md = MarkdownFormatter::format(&report());

        assert!(md.contains("# Biofilm Formation Report"));
        assert!(md.contains("**Samples classified:** 1 of 2"));
        assert!(md.contains("| S1 | 20230514a | O6 | 0.9000 | 0.1000 | strong | NA | NA |"));
        // Unclassifiable sample shows NA, never a zero threshold
        assert!(md.contains("| S2 | 20230601 | NA | 0.2000 | NA | NA | NA | NA |"));
        assert!(md.contains("| all | 0 | 0 | 0 | 1 | 1 | 2 |"));
        assert!(md.contains("No positive-control readings."));
        assert!(md.contains("**Readings without metadata** (1): S2"));
    }

    #[test]
    fn test_tukey_contrast_table() {
        use crate::analysis::{Contrast, SerotypeAnova, SerotypeGroup};

        let contrast = Contrast {
            label: "O1-O6".to_string(),
            difference: -6.0,
            q_statistic: 10.3923,
            p_adjusted: 0.0003,
        };
        let mut r = report();
        r.serotype_anova = Some(SerotypeAnova {
            groups: vec![SerotypeGroup { serotype: "O1".to_string(), n: 3, mean_od: 2.0, sd_od: Some(1.0) }],
            df_between: 2,
            df_within: 6,
            f_statistic: 27.0,
            p_value: 0.001,
            contrasts: vec![contrast.clone()],
        });
        r.significant_contrasts = vec![contrast];

        let md = MarkdownFormatter::format(&r);
        assert!(md.contains("| Contrast | Difference | q | p (Tukey) |"));
        assert!(md.contains("| O1-O6 | -6.0000 | 10.3923 | 0.0003 |"));
    }

    #[test]
    fn test_clean_diagnostics() {
        let mut r = report();
        r.diagnostics = JoinDiagnostics::default();
        assert!(MarkdownFormatter::format(&r).contains("All inputs matched."));
    }
}
