//! Analysis modules
//!
//! Each stage of the report lives in its own module. All of them are pure
//! functions over loaded records; the pipeline passes their results along
//! explicitly.

pub mod baseline;
pub mod classifier;
pub mod join;
pub mod positive_control;
pub mod serotype_anova;

// Re-export stage entry points
pub use baseline::{estimate_baselines, Baseline, BaselineTable};
pub use classifier::{classify, AppliedThresholds};
pub use join::{join_samples, ControlIds, JoinDiagnostics, JoinOutcome};
pub use positive_control::{
    aggregate_positive_controls, AlternateThresholds, BatchStats, OverallStats,
    PositiveControlSummary,
};
pub use serotype_anova::{serotype_anova, Contrast, SerotypeAnova, SerotypeGroup};
