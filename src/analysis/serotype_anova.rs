//! Serotype comparison of mean OD
//!
//! One-way ANOVA of sample mean OD across serotypes, followed by Tukey HSD
//! pairwise contrasts (Tukey-Kramer for unequal group sizes) on the ANOVA's
//! pooled mean square error with N − k degrees of freedom.
//!
//! Serotypes with fewer than 2 samples are left out. At least two remaining
//! serotypes are needed for a test.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, FisherSnedecor};
use std::collections::BTreeMap;

use crate::types::Sample;
use crate::utils::{studentized_range_sf, summarize};

/// Per-serotype group summary entering the test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerotypeGroup {
    pub serotype: String,
    pub n: usize,
    pub mean_od: f64,
    pub sd_od: Option<f64>,
}

/// One pairwise serotype contrast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contrast {
    /// "A-B": first serotype minus second, in serotype order
    pub label: String,
    pub difference: f64,
    /// Studentized range statistic
    pub q_statistic: f64,
    /// Tukey-adjusted p-value
    pub p_adjusted: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerotypeAnova {
    pub groups: Vec<SerotypeGroup>,
    pub df_between: usize,
    pub df_within: usize,
    pub f_statistic: f64,
    pub p_value: f64,
    pub contrasts: Vec<Contrast>,
}

impl SerotypeAnova {
    /// Contrasts with adjusted p below `alpha`, in label order
    pub fn significant_contrasts(&self, alpha: f64) -> Vec<&Contrast> {
        self.contrasts.iter().filter(|c| c.p_adjusted < alpha).collect()
    }
}

/// Run the ANOVA and pairwise contrasts over the samples with a serotype
///
/// Returns `None` when fewer than two serotypes have ≥ 2 samples, or the
/// within-group variance is zero.
pub fn serotype_anova(samples: &[Sample]) -> Option<SerotypeAnova> {
    let mut by_serotype: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for sample in samples {
        if let Some(serotype) = sample.serotype.as_deref() {
            by_serotype.entry(serotype).or_default().push(sample.mean_od);
        }
    }
    by_serotype.retain(|_, values| values.len() >= 2);

    let k = by_serotype.len();
    let n_total: usize = by_serotype.values().map(Vec::len).sum();
    if k < 2 || n_total <= k {
        tracing::info!("Serotype ANOVA skipped: {} serotypes with at least 2 samples", k);
        return None;
    }

    let groups: Vec<SerotypeGroup> = by_serotype
        .iter()
        .filter_map(|(serotype, values)| {
            summarize(values).map(|s| SerotypeGroup {
                serotype: serotype.to_string(),
                n: s.n,
                mean_od: s.mean,
                sd_od: s.sd,
            })
        })
        .collect();

    let grand_mean = by_serotype.values().flatten().sum::<f64>() / n_total as f64;

    let ss_between: f64 = groups
        .iter()
        .map(|g| g.n as f64 * (g.mean_od - grand_mean).powi(2))
        .sum();
    let ss_within: f64 = groups
        .iter()
        .zip(by_serotype.values())
        .map(|(g, values)| values.iter().map(|x| (x - g.mean_od).powi(2)).sum::<f64>())
        .sum();

    let df_between = k - 1;
    let df_within = n_total - k;
    let ms_between = ss_between / df_between as f64;
    let ms_within = ss_within / df_within as f64;

    if ms_within <= 0.0 || !ms_within.is_finite() {
        tracing::warn!("Serotype ANOVA skipped: zero within-serotype variance");
        return None;
    }

    let f_statistic = ms_between / ms_within;
    let f_dist = FisherSnedecor::new(df_between as f64, df_within as f64).ok()?;
    let p_value = f_dist.sf(f_statistic);

    let mut contrasts = Vec::with_capacity(k * (k - 1) / 2);
    for (i, a) in groups.iter().enumerate() {
        for b in &groups[i + 1..] {
            let difference = a.mean_od - b.mean_od;
            let se = (ms_within / 2.0 * (1.0 / a.n as f64 + 1.0 / b.n as f64)).sqrt();
            let q_statistic = difference.abs() / se;
            contrasts.push(Contrast {
                label: format!("{}-{}", a.serotype, b.serotype),
                difference,
                q_statistic,
                p_adjusted: studentized_range_sf(q_statistic, k, df_within as f64)?,
            });
        }
    }

    tracing::info!(
        "Serotype ANOVA: F({}, {}) = {:.3}, p = {:.4}",
        df_between, df_within, f_statistic, p_value
    );

    Some(SerotypeAnova {
        groups,
        df_between,
        df_within,
        f_statistic,
        p_value,
        contrasts,
    })
}
