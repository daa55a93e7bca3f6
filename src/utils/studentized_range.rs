//! Studentized range distribution
//!
//! Upper-tail probability of Q = range(Z_1..Z_k) / S, with Z_i standard
//! normal and ν·S² ~ χ²(ν). Used for Tukey HSD p-values.
//!
//! ```text
//! P(Q ≤ q) = ∫₀^∞ f_S(s) · W(q·s) ds
//! W(w)     = k ∫ φ(z) [Φ(z) − Φ(z − w)]^(k−1) dz
//! ```
//!
//! Both integrals use composite Simpson's rule. The outer range is centered on
//! s = 1 and widens as ν shrinks; the inner range is |z| ≤ 8.

use statrs::function::erf::erfc;
use statrs::function::gamma::ln_gamma;
use std::f64::consts::{FRAC_1_SQRT_2, LN_2, PI};

const INNER_INTERVALS: usize = 400;
const OUTER_INTERVALS: usize = 1000;
const Z_LIMIT: f64 = 8.0;

fn std_normal_pdf(z: f64) -> f64 {
    (-0.5 * z * z).exp() / (2.0 * PI).sqrt()
}

fn std_normal_cdf(z: f64) -> f64 {
    0.5 * erfc(-z * FRAC_1_SQRT_2)
}

/// Composite Simpson's rule; `n` is rounded up to an even count
fn simpson(f: impl Fn(f64) -> f64, a: f64, b: f64, n: usize) -> f64 {
    let n = n + n % 2;
    let h = (b - a) / n as f64;
    let interior: f64 = (1..n)
        .map(|i| {
            let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
            weight * f(a + i as f64 * h)
        })
        .sum();
    (f(a) + f(b) + interior) * h / 3.0
}

/// P(range of k standard normals ≤ w)
fn normal_range_cdf(w: f64, k: usize) -> f64 {
    if w <= 0.0 {
        return 0.0;
    }
    let integrand = |z: f64| {
        let band = std_normal_cdf(z) - std_normal_cdf(z - w);
        std_normal_pdf(z) * band.max(0.0).powi(k as i32 - 1)
    };
    (k as f64 * simpson(integrand, -Z_LIMIT, Z_LIMIT + w, INNER_INTERVALS)).clamp(0.0, 1.0)
}

/// Density of S = sqrt(χ²(ν) / ν)
fn scale_density(s: f64, df: f64) -> f64 {
    if s <= 0.0 {
        return 0.0;
    }
    let half = df / 2.0;
    let ln_density = half * df.ln() - ln_gamma(half) - (half - 1.0) * LN_2
        + (df - 1.0) * s.ln()
        - half * s * s;
    ln_density.exp()
}

/// Upper-tail probability P(Q > q) for `k` groups and `df` error degrees of freedom
///
/// Returns `None` for k < 2, non-positive or non-finite `df`, or non-finite `q`.
pub fn studentized_range_sf(q: f64, k: usize, df: f64) -> Option<f64> {
    if k < 2 || !df.is_finite() || df <= 0.0 || q.is_nan() {
        return None;
    }
    if q <= 0.0 {
        return Some(1.0);
    }
    if q.is_infinite() {
        return Some(0.0);
    }

    let spread = 12.0 / df.sqrt();
    let lower = (1.0 - spread).max(0.0);
    let upper = 1.0 + spread;

    let cdf = simpson(
        |s| scale_density(s, df) * normal_range_cdf(q * s, k),
        lower,
        upper,
        OUTER_INTERVALS,
    );
    Some((1.0 - cdf).clamp(0.0, 1.0))
}
