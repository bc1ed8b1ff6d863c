//! Big-M and bound calculations
//!
//! Constants derived from the data and the coefficient box so the big-M
//! linearizations stay valid: loose enough to never cut off a feasible
//! coefficient vector, tight enough to keep the LP relaxation useful.

use log::debug;

use crate::pipeline::coefficients::CoefficientSet;
use crate::pipeline::dataset::{Dataset, INTERCEPT_NAME};
use crate::pipeline::error::ValidationError;

use super::SlimConfig;

/// Per-sample range of the margin score contributed by non-intercept coefficients
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
}

/// Range of `sum_{j != intercept} (Y_i X_ij) rho_j` over the box, for every sample
pub fn score_ranges(dataset: &Dataset, coefs: &CoefficientSet) -> Vec<ScoreRange> {
    let intercept = dataset.intercept_index();
    let ub = coefs.ub_values();
    let lb = coefs.lb_values();

    (0..dataset.n_samples())
        .map(|i| {
            let y = f64::from(dataset.label(i));
            let mut range = ScoreRange { min: 0.0, max: 0.0 };
            for (j, &x) in dataset.row(i).iter().enumerate() {
                if Some(j) == intercept {
                    continue;
                }
                let at_ub = y * x * ub[j];
                let at_lb = y * x * lb[j];
                range.max += at_ub.max(at_lb);
                range.min += at_ub.min(at_lb);
            }
            range
        })
        .collect()
}

/// Intercept bounds `(lb, ub)` that let the intercept alone move every sample
/// to either side of the decision boundary.
///
/// `ub = -min_i(min_score_i) + 1` and `lb = -max_i(max_score_i) + 1`.
pub fn intercept_bounds(dataset: &Dataset, coefs: &CoefficientSet) -> (f64, f64) {
    let ranges = score_ranges(dataset, coefs);
    let min_score = ranges.iter().map(|r| r.min).fold(f64::INFINITY, f64::min);
    let max_score = ranges.iter().map(|r| r.max).fold(f64::NEG_INFINITY, f64::max);
    let ub = -min_score + 1.0;
    let lb = -max_score + 1.0;
    (lb, ub)
}

/// Largest possible `|(Y_i X_i) . rho|` over the box, per sample
pub fn max_score_magnitude(dataset: &Dataset, coefs: &CoefficientSet) -> Vec<f64> {
    let magnitudes: Vec<f64> = coefs
        .ub_values()
        .iter()
        .zip(coefs.lb_values())
        .map(|(ub, lb)| ub.abs().max(lb.abs()))
        .collect();

    (0..dataset.n_samples())
        .map(|i| {
            dataset
                .row(i)
                .iter()
                .zip(&magnitudes)
                .map(|(x, m)| m * x.abs())
                .sum()
        })
        .collect()
}

/// Big-M of each error linking row `score_i + M_i err_i >= epsilon`.
///
/// `M_i` covers the largest `-score_i` over the box plus the margin, so
/// `err_i = 1` always relaxes the row.
pub fn error_big_m(dataset: &Dataset, coefs: &CoefficientSet, epsilon: f64) -> Vec<f64> {
    max_score_magnitude(dataset, coefs)
        .into_iter()
        .map(|m| m + epsilon)
        .collect()
}

/// Bounds `(lb, ub)` of `beta_j = |rho_j|` for `rho_j` in `[lb, ub]`
pub fn beta_bounds(lb: f64, ub: f64) -> (f64, f64) {
    let upper = ub.abs().max(lb.abs());
    let lower = if lb > 0.0 {
        lb
    } else if ub < 0.0 {
        -ub
    } else {
        0.0
    };
    (lower, upper)
}

/// Default L0 penalty: small enough that one fewer mistake always beats one
/// fewer nonzero coefficient.
pub fn default_c0(n_samples: usize, n_variables: usize) -> f64 {
    0.9 / (n_samples as f64 * n_variables as f64)
}

/// Default L1 penalty: the whole L1 term stays below one unit of `c0`.
pub fn default_c1(c0: f64, beta_ub: &[f64]) -> f64 {
    let l1_max: f64 = beta_ub.iter().sum();
    if l1_max > 0.0 {
        0.975 * c0 / l1_max
    } else {
        0.0
    }
}

/// Build the default coefficient set for `dataset`: every coefficient is an
/// integer in `[-max_coef, max_coef]`, and the intercept gets either
/// `[-max_offset, max_offset]` or the computed range from [`intercept_bounds`].
pub fn prepare_coefficients(
    dataset: &Dataset,
    config: &SlimConfig,
) -> Result<CoefficientSet, ValidationError> {
    let mut coefs =
        CoefficientSet::new(dataset.variable_names(), -config.max_coef, config.max_coef)?;

    if dataset.intercept_index().is_some() {
        let (lb, ub) = match config.max_offset {
            Some(offset) => (-offset.abs(), offset.abs()),
            None => intercept_bounds(dataset, &coefs),
        };
        debug!("intercept bounds: [{}, {}]", lb, ub);
        coefs.set_bounds(INTERCEPT_NAME, lb, ub)?;
    }

    Ok(coefs)
}
