//! Solution verification
//!
//! Cross-checks a solved assignment against every invariant the formulation
//! models. Any violation is an error: an unverified model is never reported
//! as valid.

use crate::pipeline::coefficients::CoefType;
use crate::pipeline::dataset::Dataset;
use crate::pipeline::error::{Invariant, VerificationError};

use super::info::{CountBounds, SlimInfo, VarGroup};

/// Absolute tolerance for every floating point comparison
pub const TOLERANCE: f64 = 1e-6;

/// Facts established by a successful verification
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedSolution {
    pub rho: Vec<f64>,
    pub l0_norm: usize,
    pub total_error: usize,
    pub total_error_pos: usize,
    pub total_error_neg: usize,
}

/// Check `assignment` against the invariants recorded in `info`.
///
/// Checks run in a fixed order and the first violation is returned.
pub fn verify_solution(
    assignment: &[f64],
    info: &SlimInfo,
    dataset: &Dataset,
) -> Result<VerifiedSolution, VerificationError> {
    if assignment.len() != info.n_variables() {
        return Err(VerificationError::LengthMismatch {
            expected: info.n_variables(),
            actual: assignment.len(),
        });
    }
    if dataset.n_samples() != info.n_samples || dataset.n_variables() != info.n_coefficients() {
        return Err(VerificationError::DatasetMismatch {
            expected_rows: info.n_samples,
            expected_cols: info.n_coefficients(),
            actual_rows: dataset.n_samples(),
            actual_cols: dataset.n_variables(),
        });
    }

    let rho = info.values(VarGroup::Rho, assignment);
    let alpha = info.values(VarGroup::Alpha, assignment);
    let beta = info.values(VarGroup::Beta, assignment);
    let err = info.values(VarGroup::Error, assignment);
    let total_error = info.scalar(VarGroup::TotalError, assignment);
    let total_error_pos = info.scalar(VarGroup::TotalErrorPos, assignment);
    let total_error_neg = info.scalar(VarGroup::TotalErrorNeg, assignment);
    let total_l0_norm = info.scalar(VarGroup::TotalL0Norm, assignment);

    // coefficients
    for (j, &r) in rho.iter().enumerate() {
        if r > info.rho_ub[j] + TOLERANCE {
            return violation(VarGroup::Rho, j, Invariant::RhoUpperBound, info.rho_ub[j], r);
        }
        if r < info.rho_lb[j] - TOLERANCE {
            return violation(VarGroup::Rho, j, Invariant::RhoLowerBound, info.rho_lb[j], r);
        }
        if info.rho_type[j] == CoefType::Integer && !is_integral(r) {
            return violation(VarGroup::Rho, j, Invariant::RhoIntegral, r.round(), r);
        }
    }

    // L0 indicators
    for (k, &a) in alpha.iter().enumerate() {
        let j = info.alpha_coef[k];
        if !is_binary(a) {
            return violation(VarGroup::Alpha, j, Invariant::AlphaBinary, a.round(), a);
        }
        if is_zero(a) && !is_zero(rho[j]) {
            return violation(VarGroup::Rho, j, Invariant::AlphaZeroImpliesRhoZero, 0.0, rho[j]);
        }
        if !is_zero(rho[j]) && !is_one(a) {
            return violation(VarGroup::Alpha, j, Invariant::NonzeroRhoImpliesAlpha, 1.0, a);
        }
    }

    // L1 helpers
    for (k, &b) in beta.iter().enumerate() {
        let j = info.beta_coef[k];
        let expected = rho[j].abs();
        if (b - expected).abs() > TOLERANCE {
            return violation(VarGroup::Beta, j, Invariant::BetaEqualsAbsRho, expected, b);
        }
        if b > info.beta_ub[k] + TOLERANCE {
            return violation(VarGroup::Beta, j, Invariant::BetaUpperBound, info.beta_ub[k], b);
        }
        if b < info.beta_lb[k] - TOLERANCE {
            return violation(VarGroup::Beta, j, Invariant::BetaLowerBound, info.beta_lb[k], b);
        }
    }

    // L0 norm
    let alpha_sum: f64 = alpha.iter().sum();
    if (total_l0_norm - alpha_sum).abs() > TOLERANCE {
        return violation(
            VarGroup::TotalL0Norm,
            0,
            Invariant::L0NormEqualsAlphaSum,
            alpha_sum,
            total_l0_norm,
        );
    }
    let cardinality = rho
        .iter()
        .zip(&info.l0_reg_ind)
        .filter(|&(&r, &reg)| reg && !is_zero(r))
        .count();
    if (total_l0_norm - cardinality as f64).abs() > TOLERANCE {
        return violation(
            VarGroup::TotalL0Norm,
            0,
            Invariant::L0NormEqualsCardinality,
            cardinality as f64,
            total_l0_norm,
        );
    }
    if cardinality < info.l0_min {
        return violation(
            VarGroup::TotalL0Norm,
            0,
            Invariant::L0NormLowerBudget,
            info.l0_min as f64,
            cardinality as f64,
        );
    }
    if cardinality > info.l0_max {
        return violation(
            VarGroup::TotalL0Norm,
            0,
            Invariant::L0NormUpperBudget,
            info.l0_max as f64,
            cardinality as f64,
        );
    }

    // error indicators
    let scores: Vec<f64> = (0..dataset.n_samples())
        .map(|i| dataset.margin_score(i, rho))
        .collect();
    for (i, (&e, &score)) in err.iter().zip(&scores).enumerate() {
        if !is_binary(e) {
            return violation(VarGroup::Error, i, Invariant::ErrorBinary, e.round(), e);
        }
        let expected = if score < info.epsilon { 1.0 } else { 0.0 };
        let ambiguous = (score - info.epsilon).abs() <= TOLERANCE;
        if (e - expected).abs() > TOLERANCE && !ambiguous {
            return violation(VarGroup::Error, i, Invariant::ErrorLinking, expected, e);
        }
    }

    // aggregate error counts
    let err_sum: f64 = err.iter().sum();
    let err_pos: f64 = masked_sum(err, &info.pos_ind);
    let err_neg: f64 = masked_sum(err, &info.neg_ind);
    let aggregates = [
        (VarGroup::TotalError, Invariant::TotalErrorSum, err_sum, total_error),
        (VarGroup::TotalErrorPos, Invariant::TotalErrorPosSum, err_pos, total_error_pos),
        (VarGroup::TotalErrorNeg, Invariant::TotalErrorNegSum, err_neg, total_error_neg),
        (
            VarGroup::TotalError,
            Invariant::TotalErrorSplit,
            total_error_pos + total_error_neg,
            total_error,
        ),
    ];
    for (group, invariant, expected, observed) in aggregates {
        if (expected - observed).abs() > TOLERANCE {
            return violation(group, 0, invariant, expected, observed);
        }
    }
    for (group, bounds, observed) in [
        (VarGroup::TotalError, info.total_error_bounds, total_error),
        (VarGroup::TotalErrorPos, info.total_error_pos_bounds, total_error_pos),
        (VarGroup::TotalErrorNeg, info.total_error_neg_bounds, total_error_neg),
    ] {
        check_budget(group, bounds, observed)?;
    }

    // big-M
    for (i, &score) in scores.iter().enumerate() {
        if -score > info.big_m[i] + TOLERANCE {
            return violation(VarGroup::Error, i, Invariant::BigMCoversScore, info.big_m[i], -score);
        }
    }

    Ok(VerifiedSolution {
        rho: rho.to_vec(),
        l0_norm: cardinality,
        total_error: total_error.round() as usize,
        total_error_pos: total_error_pos.round() as usize,
        total_error_neg: total_error_neg.round() as usize,
    })
}

/// The unique assignment consistent with coefficient vector `rho`.
///
/// Indicators and aggregates are derived from `rho` exactly as the verifier
/// expects them; bounds and budgets are not enforced here.
pub fn assignment_from_coefficients(rho: &[f64], info: &SlimInfo, dataset: &Dataset) -> Vec<f64> {
    let mut values = vec![0.0; info.n_variables()];
    let layout = info.layout;

    values[layout.rho.indices()].copy_from_slice(rho);
    for (k, &j) in info.alpha_coef.iter().enumerate() {
        values[layout.alpha.start + k] = if rho[j] != 0.0 { 1.0 } else { 0.0 };
    }
    for (k, &j) in info.beta_coef.iter().enumerate() {
        values[layout.beta.start + k] = rho[j].abs();
    }

    let (mut pos, mut neg) = (0.0, 0.0);
    for i in 0..dataset.n_samples() {
        let e = if dataset.margin_score(i, rho) < info.epsilon { 1.0 } else { 0.0 };
        values[layout.error.start + i] = e;
        if dataset.label(i) == 1 {
            pos += e;
        } else {
            neg += e;
        }
    }
    values[layout.total_error.start] = pos + neg;
    values[layout.total_error_pos.start] = pos;
    values[layout.total_error_neg.start] = neg;
    values[layout.total_l0_norm.start] = info
        .alpha_coef
        .iter()
        .filter(|&&j| rho[j] != 0.0)
        .count() as f64;
    values
}

fn violation<T>(
    group: VarGroup,
    index: usize,
    invariant: Invariant,
    expected: f64,
    observed: f64,
) -> Result<T, VerificationError> {
    Err(VerificationError::Violation {
        group,
        index,
        invariant,
        expected,
        observed,
    })
}

fn check_budget(group: VarGroup, bounds: CountBounds, observed: f64) -> Result<(), VerificationError> {
    if observed < bounds.min as f64 - TOLERANCE {
        return violation(group, 0, Invariant::ErrorLowerBudget, bounds.min as f64, observed);
    }
    if observed > bounds.max as f64 + TOLERANCE {
        return violation(group, 0, Invariant::ErrorUpperBudget, bounds.max as f64, observed);
    }
    Ok(())
}

fn masked_sum(values: &[f64], mask: &[bool]) -> f64 {
    values
        .iter()
        .zip(mask)
        .filter(|&(_, &m)| m)
        .map(|(v, _)| v)
        .sum()
}

#[inline]
pub(crate) fn is_zero(value: f64) -> bool {
    value.abs() <= TOLERANCE
}

#[inline]
fn is_one(value: f64) -> bool {
    (value - 1.0).abs() <= TOLERANCE
}

#[inline]
fn is_binary(value: f64) -> bool {
    is_zero(value) || is_one(value)
}

#[inline]
fn is_integral(value: f64) -> bool {
    (value - value.round()).abs() <= TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::dataset::INTERCEPT_NAME;
    use crate::pipeline::solver::bounds::prepare_coefficients;
    use crate::pipeline::solver::formulation::{build_formulation, Formulation};
    use crate::pipeline::solver::SlimConfig;

    fn setup() -> (Dataset, Formulation) {
        let d = Dataset::new(
            vec![
                vec![1.0, 1.0],
                vec![1.0, 2.0],
                vec![1.0, -1.0],
                vec![1.0, -2.0],
            ],
            vec![1.0, 1.0, -1.0, -1.0],
            vec![INTERCEPT_NAME.to_string(), "x".to_string()],
            None,
            None,
        )
        .unwrap();
        let config = SlimConfig::default();
        let coefs = prepare_coefficients(&d, &config).unwrap();
        let f = build_formulation(&d, &coefs, config).unwrap();
        (d, f)
    }

    #[test]
    fn test_consistent_assignment_passes() {
        let (d, f) = setup();
        let values = assignment_from_coefficients(&[0.0, 3.0], &f.info, &d);
        let verified = verify_solution(&values, &f.info, &d).unwrap();
        assert_eq!(verified.total_error, 0);
        assert_eq!(verified.l0_norm, 1);
        assert_eq!(f.spec.max_violation(&values), 0.0);
    }

    #[test]
    fn test_intercept_only_assignment_counts_errors() {
        let (d, f) = setup();
        let values = assignment_from_coefficients(&[1.0, 0.0], &f.info, &d);
        let verified = verify_solution(&values, &f.info, &d).unwrap();
        assert_eq!(verified.total_error, 2);
        assert_eq!(verified.total_error_neg, 2);
        assert_eq!(verified.l0_norm, 0);
    }

    #[test]
    fn test_wrong_length() {
        let (d, f) = setup();
        let err = verify_solution(&[0.0; 3], &f.info, &d).unwrap_err();
        assert!(matches!(err, VerificationError::LengthMismatch { actual: 3, .. }));
    }

    #[test]
    fn test_alpha_zero_with_nonzero_rho() {
        let (d, f) = setup();
        let mut values = assignment_from_coefficients(&[0.0, 3.0], &f.info, &d);
        values[f.info.alpha_index(1).unwrap()] = 0.0;
        let err = verify_solution(&values, &f.info, &d).unwrap_err();
        assert_eq!(err.invariant(), Some(Invariant::AlphaZeroImpliesRhoZero));
    }

    #[test]
    fn test_flipped_error_indicator() {
        let (d, f) = setup();
        let mut values = assignment_from_coefficients(&[0.0, 3.0], &f.info, &d);
        values[f.info.range(VarGroup::Error).start + 1] = 1.0;
        let err = verify_solution(&values, &f.info, &d).unwrap_err();
        assert_eq!(
            err,
            VerificationError::Violation {
                group: VarGroup::Error,
                index: 1,
                invariant: Invariant::ErrorLinking,
                expected: 0.0,
                observed: 1.0,
            }
        );
    }

    #[test]
    fn test_beta_must_equal_abs_rho() {
        let (d, f) = setup();
        let mut values = assignment_from_coefficients(&[0.0, -2.0], &f.info, &d);
        values[f.info.beta_index(1).unwrap()] = 3.0;
        let err = verify_solution(&values, &f.info, &d).unwrap_err();
        assert_eq!(err.invariant(), Some(Invariant::BetaEqualsAbsRho));
    }
}
