//! Formulation index map
//!
//! `SlimInfo` records where every variable group lives inside the flat
//! variable vector together with the derived constants the verifier and the
//! summarizer need. It is built once by the formulation builder and never
//! mutated afterwards.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::pipeline::coefficients::CoefType;
use crate::pipeline::error::FormulationError;

/// Logical group of decision variables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VarGroup {
    Rho,
    Alpha,
    Beta,
    Error,
    TotalError,
    TotalErrorPos,
    TotalErrorNeg,
    TotalL0Norm,
}

impl VarGroup {
    pub const ALL: [VarGroup; 8] = [
        VarGroup::Rho,
        VarGroup::Alpha,
        VarGroup::Beta,
        VarGroup::Error,
        VarGroup::TotalError,
        VarGroup::TotalErrorPos,
        VarGroup::TotalErrorNeg,
        VarGroup::TotalL0Norm,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            VarGroup::Rho => "rho",
            VarGroup::Alpha => "alpha",
            VarGroup::Beta => "beta",
            VarGroup::Error => "err",
            VarGroup::TotalError => "total_error",
            VarGroup::TotalErrorPos => "total_error_pos",
            VarGroup::TotalErrorNeg => "total_error_neg",
            VarGroup::TotalL0Norm => "total_l0_norm",
        }
    }
}

impl std::fmt::Display for VarGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Half-open index range `[start, end)` in the flat variable vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRange {
    pub start: usize,
    pub end: usize,
}

impl GroupRange {
    pub fn new(start: usize, len: usize) -> Self {
        Self {
            start,
            end: start + len,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn indices(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

/// Layout of the flattened variable vector, one range per group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableLayout {
    pub rho: GroupRange,
    pub alpha: GroupRange,
    pub beta: GroupRange,
    pub error: GroupRange,
    pub total_error: GroupRange,
    pub total_error_pos: GroupRange,
    pub total_error_neg: GroupRange,
    pub total_l0_norm: GroupRange,
}

impl VariableLayout {
    /// Lay groups out back to back in `VarGroup::ALL` order
    pub fn contiguous(n_rho: usize, n_alpha: usize, n_beta: usize, n_error: usize) -> Self {
        let rho = GroupRange::new(0, n_rho);
        let alpha = GroupRange::new(rho.end, n_alpha);
        let beta = GroupRange::new(alpha.end, n_beta);
        let error = GroupRange::new(beta.end, n_error);
        let total_error = GroupRange::new(error.end, 1);
        let total_error_pos = GroupRange::new(total_error.end, 1);
        let total_error_neg = GroupRange::new(total_error_pos.end, 1);
        let total_l0_norm = GroupRange::new(total_error_neg.end, 1);
        Self {
            rho,
            alpha,
            beta,
            error,
            total_error,
            total_error_pos,
            total_error_neg,
            total_l0_norm,
        }
    }

    pub fn range(&self, group: VarGroup) -> GroupRange {
        match group {
            VarGroup::Rho => self.rho,
            VarGroup::Alpha => self.alpha,
            VarGroup::Beta => self.beta,
            VarGroup::Error => self.error,
            VarGroup::TotalError => self.total_error,
            VarGroup::TotalErrorPos => self.total_error_pos,
            VarGroup::TotalErrorNeg => self.total_error_neg,
            VarGroup::TotalL0Norm => self.total_l0_norm,
        }
    }

    pub fn n_variables(&self) -> usize {
        self.total_l0_norm.end
    }
}

/// Inclusive integer bounds on an aggregate count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountBounds {
    pub min: usize,
    pub max: usize,
}

/// Index map and derived constants of one SLIM formulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlimInfo {
    pub layout: VariableLayout,
    pub n_samples: usize,
    pub variable_names: Vec<String>,

    pub rho_lb: Vec<f64>,
    pub rho_ub: Vec<f64>,
    pub rho_type: Vec<CoefType>,
    pub l0_reg_ind: Vec<bool>,
    pub l1_reg_ind: Vec<bool>,
    /// Coefficient index of each alpha variable
    pub alpha_coef: Vec<usize>,
    /// Coefficient index of each beta variable
    pub beta_coef: Vec<usize>,
    pub beta_lb: Vec<f64>,
    pub beta_ub: Vec<f64>,

    pub pos_ind: Vec<bool>,
    pub neg_ind: Vec<bool>,
    pub n_pos: usize,
    pub n_neg: usize,
    /// Per-sample big-M of the error linking rows
    pub big_m: Vec<f64>,

    pub epsilon: f64,
    pub l0_min: usize,
    pub l0_max: usize,
    pub total_error_bounds: CountBounds,
    pub total_error_pos_bounds: CountBounds,
    pub total_error_neg_bounds: CountBounds,
    pub c0: f64,
    pub c1: f64,
    pub w_pos: f64,
    pub w_neg: f64,
}

impl SlimInfo {
    pub fn n_variables(&self) -> usize {
        self.layout.n_variables()
    }

    pub fn n_coefficients(&self) -> usize {
        self.variable_names.len()
    }

    pub fn range(&self, group: VarGroup) -> GroupRange {
        self.layout.range(group)
    }

    /// Slice of `assignment` belonging to `group`
    pub fn values<'a>(&self, group: VarGroup, assignment: &'a [f64]) -> &'a [f64] {
        &assignment[self.range(group).indices()]
    }

    /// Value of a single-variable group such as `total_error`
    pub fn scalar(&self, group: VarGroup, assignment: &[f64]) -> f64 {
        assignment[self.range(group).start]
    }

    /// Flat index of the alpha variable for coefficient `j`, if it is L0-regularized
    pub fn alpha_index(&self, j: usize) -> Option<usize> {
        self.alpha_coef
            .iter()
            .position(|&c| c == j)
            .map(|k| self.layout.alpha.start + k)
    }

    /// Flat index of the beta variable for coefficient `j`, if it is L1-regularized
    pub fn beta_index(&self, j: usize) -> Option<usize> {
        self.beta_coef
            .iter()
            .position(|&c| c == j)
            .map(|k| self.layout.beta.start + k)
    }

    /// Check that every per-group vector matches the layout
    ///
    /// A map read from disk may be stale or hand-edited; the verifier and the
    /// summarizer index through it without further checks.
    pub fn validate(&self) -> std::result::Result<(), FormulationError> {
        let n_coefs = self.n_coefficients();
        let expected = VariableLayout::contiguous(
            n_coefs,
            self.alpha_coef.len(),
            self.beta_coef.len(),
            self.n_samples,
        );
        if self.layout != expected {
            return Err(FormulationError::NonContiguousLayout);
        }

        let lengths: [(&'static str, usize, usize); 10] = [
            ("rho_lb", self.rho_lb.len(), n_coefs),
            ("rho_ub", self.rho_ub.len(), n_coefs),
            ("rho_type", self.rho_type.len(), n_coefs),
            ("l0_reg_ind", self.l0_reg_ind.len(), n_coefs),
            ("l1_reg_ind", self.l1_reg_ind.len(), n_coefs),
            ("beta_lb", self.beta_lb.len(), self.beta_coef.len()),
            ("beta_ub", self.beta_ub.len(), self.beta_coef.len()),
            ("pos_ind", self.pos_ind.len(), self.n_samples),
            ("neg_ind", self.neg_ind.len(), self.n_samples),
            ("big_m", self.big_m.len(), self.n_samples),
        ];
        for (field, actual, expected) in lengths {
            if actual != expected {
                return Err(FormulationError::FieldLength {
                    field,
                    expected,
                    actual,
                });
            }
        }

        for (field, indices) in [("alpha_coef", &self.alpha_coef), ("beta_coef", &self.beta_coef)] {
            if let Some(&index) = indices.iter().find(|&&j| j >= n_coefs) {
                return Err(FormulationError::CoefficientOutOfRange {
                    field,
                    index,
                    n_coefficients: n_coefs,
                });
            }
        }
        Ok(())
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize formulation index map to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write index map to {}", path.display()))?;
        Ok(())
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read index map from {}", path.display()))?;
        let info: SlimInfo = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse index map in {}", path.display()))?;
        info.validate()
            .with_context(|| format!("Inconsistent index map in {}", path.display()))?;
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contiguous_layout() {
        let layout = VariableLayout::contiguous(3, 2, 2, 5);
        assert_eq!(layout.rho, GroupRange { start: 0, end: 3 });
        assert_eq!(layout.alpha, GroupRange { start: 3, end: 5 });
        assert_eq!(layout.beta, GroupRange { start: 5, end: 7 });
        assert_eq!(layout.error, GroupRange { start: 7, end: 12 });
        assert_eq!(layout.total_error.start, 12);
        assert_eq!(layout.total_l0_norm.start, 15);
        assert_eq!(layout.n_variables(), 16);
    }

    #[test]
    fn test_groups_partition_the_vector() {
        let layout = VariableLayout::contiguous(4, 3, 0, 7);
        let total: usize = VarGroup::ALL.iter().map(|&g| layout.range(g).len()).sum();
        assert_eq!(total, layout.n_variables());
        assert!(layout.beta.is_empty());
    }

    fn small_info() -> SlimInfo {
        SlimInfo {
            layout: VariableLayout::contiguous(2, 1, 1, 3),
            n_samples: 3,
            variable_names: vec!["(Intercept)".to_string(), "x".to_string()],
            rho_lb: vec![-5.0, -2.0],
            rho_ub: vec![5.0, 2.0],
            rho_type: vec![CoefType::Integer; 2],
            l0_reg_ind: vec![false, true],
            l1_reg_ind: vec![false, true],
            alpha_coef: vec![1],
            beta_coef: vec![1],
            beta_lb: vec![0.0],
            beta_ub: vec![2.0],
            pos_ind: vec![true, false, true],
            neg_ind: vec![false, true, false],
            n_pos: 2,
            n_neg: 1,
            big_m: vec![9.0; 3],
            epsilon: 0.001,
            l0_min: 0,
            l0_max: 1,
            total_error_bounds: CountBounds { min: 0, max: 3 },
            total_error_pos_bounds: CountBounds { min: 0, max: 2 },
            total_error_neg_bounds: CountBounds { min: 0, max: 1 },
            c0: 0.1,
            c1: 0.01,
            w_pos: 1.0,
            w_neg: 1.0,
        }
    }

    #[test]
    fn test_validate_accepts_consistent_map() {
        assert_eq!(small_info().validate(), Ok(()));
        assert_eq!(small_info().alpha_index(1), Some(2));
        assert_eq!(small_info().beta_index(0), None);
    }

    #[test]
    fn test_validate_rejects_inconsistent_maps() {
        let mut info = small_info();
        info.alpha_coef = vec![7];
        assert_eq!(
            info.validate(),
            Err(FormulationError::CoefficientOutOfRange {
                field: "alpha_coef",
                index: 7,
                n_coefficients: 2,
            })
        );

        let mut info = small_info();
        info.big_m.pop();
        assert_eq!(
            info.validate(),
            Err(FormulationError::FieldLength {
                field: "big_m",
                expected: 3,
                actual: 2,
            })
        );

        let mut info = small_info();
        info.beta_coef.clear();
        assert_eq!(info.validate(), Err(FormulationError::NonContiguousLayout));

        let mut info = small_info();
        info.rho_type.push(CoefType::Continuous);
        assert!(matches!(
            info.validate(),
            Err(FormulationError::FieldLength { field: "rho_type", .. })
        ));
    }
}
