//! SLIM formulation builder
//!
//! Translates a dataset and a coefficient set into a [`MipSpec`] and the
//! matching [`SlimInfo`] index map.
//!
//! Variables, in flat order: `rho | alpha | beta | err | total_error |
//! total_error_pos | total_error_neg | total_l0_norm`.
//!
//! Rows:
//! - L0 linking: `lb_j alpha_j <= rho_j <= ub_j alpha_j`
//! - L1 linking: `beta_j >= rho_j`, `beta_j >= -rho_j`
//! - error linking: `(Y_i X_i) . rho + M_i err_i >= epsilon`
//! - aggregate definitions for the L0 norm and the error counts
//!
//! Budgets on the aggregates are carried as variable bounds.

use log::{debug, info};

use crate::pipeline::coefficients::{CoefType, CoefficientSet};
use crate::pipeline::dataset::Dataset;
use crate::pipeline::error::FormulationError;
use crate::pipeline::weights::class_weight;

use super::bounds::{beta_bounds, default_c0, default_c1, error_big_m};
use super::info::{CountBounds, SlimInfo, VarGroup, VariableLayout};
use super::problem::{Domain, MipSpec, ObjectiveSense, Sense};
use super::SlimConfig;

/// A built formulation: the solver input plus its index map
#[derive(Debug, Clone, PartialEq)]
pub struct Formulation {
    pub spec: MipSpec,
    pub info: SlimInfo,
}

/// Build the SLIM MIP for `dataset` under the coefficient constraints `coefs`.
pub fn build_formulation(
    dataset: &Dataset,
    coefs: &CoefficientSet,
    config: SlimConfig,
) -> Result<Formulation, FormulationError> {
    check_alignment(dataset, coefs)?;
    check_parameters(&config)?;

    let n = dataset.n_samples();
    let p = dataset.n_variables();
    let n_pos = dataset.n_pos();
    let n_neg = dataset.n_neg();
    let rho_lb = coefs.lb_values().to_vec();
    let rho_ub = coefs.ub_values().to_vec();

    for view in coefs.iter() {
        if view.lb > view.ub {
            return Err(FormulationError::EmptyBox {
                name: view.name.to_string(),
                lb: view.lb,
                ub: view.ub,
            });
        }
    }

    let c0 = config.c0.map_or_else(|| default_c0(n, p), |c| c.min(1.0));

    // L0 budget
    let alpha_coef: Vec<usize> = (0..p).filter(|&j| coefs.l0_reg_ind()[j]).collect();
    let n_l0 = alpha_coef.len();
    let l0_max = config.l0_max.map_or(n_l0, |m| m.min(n_l0));
    let l0_min = config.l0_min;
    if l0_min > l0_max {
        return Err(FormulationError::EmptyL0Budget {
            min: l0_min,
            max: l0_max,
        });
    }
    let forced = alpha_coef
        .iter()
        .filter(|&&j| rho_lb[j] > 0.0 || rho_ub[j] < 0.0)
        .count();
    if forced > l0_max {
        return Err(FormulationError::ForcedNonzero { forced, l0_max });
    }

    // L1 tie-breaker
    let l1_candidates: Vec<usize> = (0..p).filter(|&j| coefs.l1_reg_ind()[j]).collect();
    let candidate_beta_ub: Vec<f64> = l1_candidates
        .iter()
        .map(|&j| beta_bounds(rho_lb[j], rho_ub[j]).1)
        .collect();
    let c1 = config.c1.unwrap_or_else(|| default_c1(c0, &candidate_beta_ub));
    let beta_coef: Vec<usize> = if c1 > 0.0 { l1_candidates } else { Vec::new() };
    let (beta_lb, beta_ub): (Vec<f64>, Vec<f64>) = beta_coef
        .iter()
        .map(|&j| beta_bounds(rho_lb[j], rho_ub[j]))
        .unzip();

    // error budgets
    let total_error_bounds = count_bounds("total_error", config.err_min, config.err_max, n)?;
    let total_error_pos_bounds =
        count_bounds("total_error_pos", config.pos_err_min, config.pos_err_max, n_pos)?;
    let total_error_neg_bounds =
        count_bounds("total_error_neg", config.neg_err_min, config.neg_err_max, n_neg)?;

    let big_m = error_big_m(dataset, coefs, config.epsilon);
    let layout = VariableLayout::contiguous(p, alpha_coef.len(), beta_coef.len(), n);

    let mut spec = MipSpec::new("slim");

    for view in coefs.iter() {
        let domain = match view.vtype {
            CoefType::Integer => Domain::Integer,
            CoefType::Continuous => Domain::Continuous,
        };
        spec.add_variable(format!("rho_{}", view.index), view.lb, view.ub, domain);
    }
    for &j in &alpha_coef {
        spec.add_variable(format!("alpha_{}", j), 0.0, 1.0, Domain::Binary);
    }
    for (k, &j) in beta_coef.iter().enumerate() {
        spec.add_variable(format!("beta_{}", j), beta_lb[k], beta_ub[k], Domain::Continuous);
    }
    for i in 0..n {
        spec.add_variable(format!("err_{}", i), 0.0, 1.0, Domain::Binary);
    }
    for (group, bounds) in [
        (VarGroup::TotalError, total_error_bounds),
        (VarGroup::TotalErrorPos, total_error_pos_bounds),
        (VarGroup::TotalErrorNeg, total_error_neg_bounds),
        (VarGroup::TotalL0Norm, CountBounds { min: l0_min, max: l0_max }),
    ] {
        spec.add_variable(
            group.as_str(),
            bounds.min as f64,
            bounds.max as f64,
            Domain::Integer,
        );
    }
    debug_assert_eq!(spec.num_variables(), layout.n_variables());

    let rho_idx = |j: usize| layout.rho.start + j;
    let alpha_idx = |k: usize| layout.alpha.start + k;
    let beta_idx = |k: usize| layout.beta.start + k;
    let err_idx = |i: usize| layout.error.start + i;

    // L0 linking
    for (k, &j) in alpha_coef.iter().enumerate() {
        spec.add_constraint(
            format!("l0_ub_{}", j),
            vec![(rho_idx(j), 1.0), (alpha_idx(k), -rho_ub[j])],
            Sense::Le,
            0.0,
        );
        spec.add_constraint(
            format!("l0_lb_{}", j),
            vec![(rho_idx(j), 1.0), (alpha_idx(k), -rho_lb[j])],
            Sense::Ge,
            0.0,
        );
    }

    // L1 linking
    for (k, &j) in beta_coef.iter().enumerate() {
        spec.add_constraint(
            format!("l1_pos_{}", j),
            vec![(beta_idx(k), 1.0), (rho_idx(j), -1.0)],
            Sense::Ge,
            0.0,
        );
        spec.add_constraint(
            format!("l1_neg_{}", j),
            vec![(beta_idx(k), 1.0), (rho_idx(j), 1.0)],
            Sense::Ge,
            0.0,
        );
    }

    // error linking
    for i in 0..n {
        let y = f64::from(dataset.label(i));
        let mut terms: Vec<(usize, f64)> = dataset
            .row(i)
            .iter()
            .enumerate()
            .map(|(j, &x)| (rho_idx(j), y * x))
            .collect();
        terms.push((err_idx(i), big_m[i]));
        spec.add_constraint(format!("error_{}", i), terms, Sense::Ge, config.epsilon);
    }

    // aggregate definitions
    let total = |group: VarGroup| layout.range(group).start;
    let mut l0_terms = vec![(total(VarGroup::TotalL0Norm), 1.0)];
    l0_terms.extend((0..alpha_coef.len()).map(|k| (alpha_idx(k), -1.0)));
    spec.add_constraint("def_total_l0_norm", l0_terms, Sense::Eq, 0.0);

    let mut error_terms = vec![(total(VarGroup::TotalError), 1.0)];
    error_terms.extend((0..n).map(|i| (err_idx(i), -1.0)));
    spec.add_constraint("def_total_error", error_terms, Sense::Eq, 0.0);

    let mut pos_terms = vec![(total(VarGroup::TotalErrorPos), 1.0)];
    pos_terms.extend((0..n).filter(|&i| dataset.label(i) == 1).map(|i| (err_idx(i), -1.0)));
    spec.add_constraint("def_total_error_pos", pos_terms, Sense::Eq, 0.0);

    let mut neg_terms = vec![(total(VarGroup::TotalErrorNeg), 1.0)];
    neg_terms.extend((0..n).filter(|&i| dataset.label(i) == -1).map(|i| (err_idx(i), -1.0)));
    spec.add_constraint("def_total_error_neg", neg_terms, Sense::Eq, 0.0);

    spec.add_constraint(
        "def_total_error_split",
        vec![
            (total(VarGroup::TotalError), 1.0),
            (total(VarGroup::TotalErrorPos), -1.0),
            (total(VarGroup::TotalErrorNeg), -1.0),
        ],
        Sense::Eq,
        0.0,
    );

    // objective
    let mut objective = Vec::new();
    objective.extend((0..alpha_coef.len()).map(|k| (alpha_idx(k), c0)));
    objective.extend((0..beta_coef.len()).map(|k| (beta_idx(k), c1)));
    if dataset.has_uniform_weights() {
        if n_pos > 0 {
            objective.push((total(VarGroup::TotalErrorPos), config.w_pos / n_pos as f64));
        }
        if n_neg > 0 {
            objective.push((total(VarGroup::TotalErrorNeg), config.w_neg / n_neg as f64));
        }
    } else {
        let weights: Vec<f64> = (0..n).map(|i| dataset.weight(i)).collect();
        let pos_total = class_weight(&weights, &dataset.pos_ind());
        let neg_total = class_weight(&weights, &dataset.neg_ind());
        for i in 0..n {
            let coef = if dataset.label(i) == 1 {
                config.w_pos * dataset.weight(i) / pos_total
            } else {
                config.w_neg * dataset.weight(i) / neg_total
            };
            objective.push((err_idx(i), coef));
        }
    }
    spec.objective.sense = ObjectiveSense::Minimize;
    spec.objective.terms = objective.into_iter().filter(|&(_, c)| c != 0.0).collect();

    info!(
        "built SLIM formulation: {} variables ({} rho, {} alpha, {} beta, {} err), {} constraints",
        spec.num_variables(),
        p,
        alpha_coef.len(),
        beta_coef.len(),
        n,
        spec.num_constraints()
    );
    debug!(
        "C0 = {}, C1 = {}, epsilon = {}, L0 in [{}, {}]",
        c0, c1, config.epsilon, l0_min, l0_max
    );

    let mut l1_reg_ind = vec![false; p];
    for &j in &beta_coef {
        l1_reg_ind[j] = true;
    }

    let info = SlimInfo {
        layout,
        n_samples: n,
        variable_names: coefs.names().to_vec(),
        rho_lb,
        rho_ub,
        rho_type: coefs.types().to_vec(),
        l0_reg_ind: coefs.l0_reg_ind().to_vec(),
        l1_reg_ind,
        alpha_coef,
        beta_coef,
        beta_lb,
        beta_ub,
        pos_ind: dataset.pos_ind(),
        neg_ind: dataset.neg_ind(),
        n_pos,
        n_neg,
        big_m,
        epsilon: config.epsilon,
        l0_min,
        l0_max,
        total_error_bounds,
        total_error_pos_bounds,
        total_error_neg_bounds,
        c0,
        c1,
        w_pos: config.w_pos,
        w_neg: config.w_neg,
    };

    Ok(Formulation { spec, info })
}

fn check_alignment(dataset: &Dataset, coefs: &CoefficientSet) -> Result<(), FormulationError> {
    if coefs.len() != dataset.n_variables() {
        return Err(FormulationError::SizeMismatch {
            expected: dataset.n_variables(),
            actual: coefs.len(),
        });
    }
    for (index, (expected, actual)) in dataset.variable_names().iter().zip(coefs.names()).enumerate() {
        if expected != actual {
            return Err(FormulationError::NameMismatch {
                index,
                expected: expected.clone(),
                actual: actual.clone(),
            });
        }
    }
    Ok(())
}

fn check_parameters(config: &SlimConfig) -> Result<(), FormulationError> {
    let invalid = |name, value, requirement| FormulationError::InvalidParameter {
        name,
        value,
        requirement,
    };

    if !(config.epsilon.is_finite() && config.epsilon > 0.0) {
        return Err(invalid("epsilon", config.epsilon, "must be > 0"));
    }
    if let Some(c0) = config.c0 {
        if !(c0.is_finite() && c0 > 0.0) {
            return Err(invalid("C0", c0, "must be > 0"));
        }
    }
    if let Some(c1) = config.c1 {
        if !(c1.is_finite() && c1 >= 0.0) {
            return Err(invalid("C1", c1, "must be >= 0"));
        }
    }
    for (name, value) in [("w_pos", config.w_pos), ("w_neg", config.w_neg)] {
        if !(value.is_finite() && value > 0.0) {
            return Err(invalid(name, value, "must be > 0"));
        }
    }
    for (name, value) in [
        ("err_min", config.err_min),
        ("err_max", config.err_max),
        ("pos_err_min", config.pos_err_min),
        ("pos_err_max", config.pos_err_max),
        ("neg_err_min", config.neg_err_min),
        ("neg_err_max", config.neg_err_max),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(invalid(name, value, "must be in [0, 1]"));
        }
    }
    Ok(())
}

/// Integer count bounds `[ceil(min * n), floor(max * n)]`
fn count_bounds(
    which: &'static str,
    min_fraction: f64,
    max_fraction: f64,
    n: usize,
) -> Result<CountBounds, FormulationError> {
    let min = (min_fraction * n as f64).ceil() as usize;
    let max = (max_fraction * n as f64).floor() as usize;
    if min > max {
        return Err(FormulationError::EmptyErrorBudget { which, min, max });
    }
    Ok(CountBounds { min, max })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::dataset::INTERCEPT_NAME;
    use crate::pipeline::solver::bounds::prepare_coefficients;

    fn scenario() -> Dataset {
        Dataset::new(
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
        .unwrap()
    }

    fn build(config: SlimConfig) -> Result<Formulation, FormulationError> {
        let d = scenario();
        let coefs = prepare_coefficients(&d, &config).unwrap();
        build_formulation(&d, &coefs, config)
    }

    #[test]
    fn test_group_sizes() {
        let f = build(SlimConfig::default()).unwrap();
        let info = &f.info;
        assert_eq!(info.range(VarGroup::Rho).len(), 2);
        // intercept is exempt from both penalties
        assert_eq!(info.alpha_coef, vec![1]);
        assert_eq!(info.beta_coef, vec![1]);
        assert_eq!(info.range(VarGroup::Error).len(), 4);
        assert_eq!(f.spec.num_variables(), 2 + 1 + 1 + 4 + 4);
        assert_eq!(f.spec.variables[0].name, "rho_0");
        assert_eq!(f.spec.variables[2].name, "alpha_1");
        assert_eq!(f.spec.variables[f.spec.num_variables() - 1].name, "total_l0_norm");
    }

    #[test]
    fn test_error_row_uses_signed_features_and_big_m() {
        let f = build(SlimConfig::default()).unwrap();
        let row = f.spec.constraints.iter().find(|c| c.name == "error_2").unwrap();
        let err_2 = f.info.range(VarGroup::Error).start + 2;
        assert_eq!(row.sense, Sense::Ge);
        assert_eq!(row.rhs, f.info.epsilon);
        assert!(row.terms.contains(&(0, -1.0)));
        assert!(row.terms.contains(&(1, 1.0)));
        assert!(row.terms.contains(&(err_2, f.info.big_m[2])));
    }

    #[test]
    fn test_c1_zero_removes_beta_group() {
        let f = build(SlimConfig {
            c1: Some(0.0),
            ..SlimConfig::default()
        })
        .unwrap();
        assert!(f.info.range(VarGroup::Beta).is_empty());
        assert!(f.info.l1_reg_ind.iter().all(|&b| !b));
    }

    #[test]
    fn test_l0_budget_clipped_to_eligible_count() {
        let f = build(SlimConfig {
            l0_max: Some(50),
            ..SlimConfig::default()
        })
        .unwrap();
        assert_eq!(f.info.l0_max, 1);
    }

    #[test]
    fn test_empty_l0_budget_is_rejected() {
        let err = build(SlimConfig {
            l0_min: 1,
            l0_max: Some(0),
            ..SlimConfig::default()
        })
        .unwrap_err();
        assert_eq!(err, FormulationError::EmptyL0Budget { min: 1, max: 0 });
    }

    #[test]
    fn test_forced_nonzero_exceeds_budget() {
        let d = scenario();
        let config = SlimConfig {
            l0_max: Some(0),
            ..SlimConfig::default()
        };
        let mut coefs = prepare_coefficients(&d, &config).unwrap();
        coefs.set_bounds("x", 1.0, 5.0).unwrap();
        let err = build_formulation(&d, &coefs, config).unwrap_err();
        assert_eq!(err, FormulationError::ForcedNonzero { forced: 1, l0_max: 0 });
    }

    #[test]
    fn test_misaligned_coefficients_are_rejected() {
        let d = scenario();
        let names = vec!["x".to_string(), INTERCEPT_NAME.to_string()];
        let coefs = CoefficientSet::new(&names, -1.0, 1.0).unwrap();
        let err = build_formulation(&d, &coefs, SlimConfig::default()).unwrap_err();
        assert!(matches!(err, FormulationError::NameMismatch { index: 0, .. }));
    }

    #[test]
    fn test_invalid_epsilon() {
        let err = build(SlimConfig {
            epsilon: 0.0,
            ..SlimConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, FormulationError::InvalidParameter { name: "epsilon", .. }));
    }

    #[test]
    fn test_empty_error_budget() {
        let err = build(SlimConfig {
            pos_err_min: 0.9,
            pos_err_max: 0.6,
            ..SlimConfig::default()
        })
        .unwrap_err();
        assert_eq!(
            err,
            FormulationError::EmptyErrorBudget {
                which: "total_error_pos",
                min: 2,
                max: 1
            }
        );
    }

    #[test]
    fn test_objective_weights_errors_by_class_size() {
        let f = build(SlimConfig::default()).unwrap();
        let pos = f.info.range(VarGroup::TotalErrorPos).start;
        let neg = f.info.range(VarGroup::TotalErrorNeg).start;
        let coef = |k: usize| {
            f.spec
                .objective
                .terms
                .iter()
                .find(|&&(i, _)| i == k)
                .map(|&(_, c)| c)
        };
        assert_eq!(coef(pos), Some(0.5));
        assert_eq!(coef(neg), Some(0.5));
        // default C0 = 0.9 / (N * P)
        assert_eq!(coef(f.info.range(VarGroup::Alpha).start), Some(0.9 / 8.0));
    }
}
