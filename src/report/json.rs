use crate::pipeline::PipelineReport;

/// JSON formatter for pipeline reports
pub struct JsonFormatter;

impl JsonFormatter {
    /// Format report as pretty-printed JSON
    pub fn format(report: &PipelineReport) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(report)
    }

    /// Format report as compact JSON (no whitespace)
    pub fn format_compact(report: &PipelineReport) -> Result<String, serde_json::Error> {
        serde_json::to_string(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::JoinDiagnostics;
    use crate::pipeline::CategoryTallies;

    fn empty_report() -> PipelineReport {
        PipelineReport {
            baselines: Default::default(),
            samples: vec![],
            tallies: CategoryTallies::default(),
            positive_controls: None,
            alternate_thresholds: None,
            diagnostics: JoinDiagnostics::default(),
            serotype_anova: None,
            significance_level: 0.05,
            significant_contrasts: vec![],
        }
    }

    #[test]
    fn test_format_json() {
        let json = JsonFormatter::format(&empty_report()).unwrap();

        assert!(json.contains("\"significance_level\": 0.05"));
        // Absent results serialize as null, not zeros
        assert!(json.contains("\"positive_controls\": null"));
        assert!(json.contains("\"serotype_anova\": null"));
    }

    #[test]
    fn test_format_compact_round_trips() {
        let report = empty_report();
        let json = JsonFormatter::format_compact(&report).unwrap();

        assert!(!json.contains("\n  "));
        let parsed: PipelineReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
    }
}
