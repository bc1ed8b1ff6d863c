//! Coefficient constraint set
//!
//! Per-variable bounds, integrality and regularization eligibility for the
//! coefficient vector `rho`. Entries are kept in dataset column order, so
//! `rho[j]` always refers to `variable_names[j]`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::dataset::INTERCEPT_NAME;
use super::error::ValidationError;

/// Domain of a single coefficient
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoefType {
    #[default]
    Integer,
    Continuous,
}

impl std::fmt::Display for CoefType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoefType::Integer => write!(f, "I"),
            CoefType::Continuous => write!(f, "C"),
        }
    }
}

/// Read-only view of one entry of a [`CoefficientSet`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoefficientView<'a> {
    pub index: usize,
    pub name: &'a str,
    pub lb: f64,
    pub ub: f64,
    pub vtype: CoefType,
    pub l0_reg: bool,
    pub l1_reg: bool,
}

/// Bounds, type and regularization flags for every coefficient
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientSet {
    names: Vec<String>,
    positions: HashMap<String, usize>,
    ub: Vec<f64>,
    lb: Vec<f64>,
    default_ub: Vec<f64>,
    default_lb: Vec<f64>,
    vtype: Vec<CoefType>,
    l0_reg: Vec<bool>,
    l1_reg: Vec<bool>,
}

impl CoefficientSet {
    /// Create a set where every variable shares the scalar bounds `[lb, ub]`.
    pub fn new(variable_names: &[String], lb: f64, ub: f64) -> Result<Self, ValidationError> {
        let n = variable_names.len();
        Self::with_bounds(variable_names, vec![lb; n], vec![ub; n])
    }

    /// Create a set with one `(lb, ub)` pair per variable.
    pub fn with_bounds(
        variable_names: &[String],
        lb: Vec<f64>,
        ub: Vec<f64>,
    ) -> Result<Self, ValidationError> {
        let n = variable_names.len();
        for (what, len) in [("lb", lb.len()), ("ub", ub.len())] {
            if len != n {
                return Err(ValidationError::DimensionMismatch {
                    what,
                    expected: n,
                    actual: len,
                });
            }
        }

        let mut positions = HashMap::with_capacity(n);
        for (j, name) in variable_names.iter().enumerate() {
            if positions.insert(name.clone(), j).is_some() {
                return Err(ValidationError::DuplicateName(name.clone()));
            }
            check_bounds(name, lb[j], ub[j])?;
        }

        let is_regularized: Vec<bool> = variable_names
            .iter()
            .map(|name| name != INTERCEPT_NAME)
            .collect();

        Ok(Self {
            names: variable_names.to_vec(),
            positions,
            default_ub: ub.clone(),
            default_lb: lb.clone(),
            ub,
            lb,
            vtype: vec![CoefType::Integer; n],
            l0_reg: is_regularized.clone(),
            l1_reg: is_regularized,
        })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Column index of `name`
    pub fn position(&self, name: &str) -> Result<usize, ValidationError> {
        self.positions
            .get(name)
            .copied()
            .ok_or_else(|| ValidationError::UnknownVariable(name.to_string()))
    }

    pub fn ub(&self, name: &str) -> Result<f64, ValidationError> {
        Ok(self.ub[self.position(name)?])
    }

    pub fn lb(&self, name: &str) -> Result<f64, ValidationError> {
        Ok(self.lb[self.position(name)?])
    }

    pub fn vtype(&self, name: &str) -> Result<CoefType, ValidationError> {
        Ok(self.vtype[self.position(name)?])
    }

    pub fn l0_reg(&self, name: &str) -> Result<bool, ValidationError> {
        Ok(self.l0_reg[self.position(name)?])
    }

    pub fn l1_reg(&self, name: &str) -> Result<bool, ValidationError> {
        Ok(self.l1_reg[self.position(name)?])
    }

    /// Set the upper bound; fails without modifying the set if `ub < lb`.
    pub fn set_ub(&mut self, name: &str, value: f64) -> Result<(), ValidationError> {
        let j = self.position(name)?;
        check_bounds(name, self.lb[j], value)?;
        self.ub[j] = value;
        Ok(())
    }

    /// Set the lower bound; fails without modifying the set if `ub < lb`.
    pub fn set_lb(&mut self, name: &str, value: f64) -> Result<(), ValidationError> {
        let j = self.position(name)?;
        check_bounds(name, value, self.ub[j])?;
        self.lb[j] = value;
        Ok(())
    }

    /// Set both bounds at once.
    pub fn set_bounds(&mut self, name: &str, lb: f64, ub: f64) -> Result<(), ValidationError> {
        let j = self.position(name)?;
        check_bounds(name, lb, ub)?;
        self.lb[j] = lb;
        self.ub[j] = ub;
        Ok(())
    }

    /// Restore the bounds given at construction.
    pub fn reset(&mut self, name: &str) -> Result<(), ValidationError> {
        let j = self.position(name)?;
        self.lb[j] = self.default_lb[j];
        self.ub[j] = self.default_ub[j];
        Ok(())
    }

    pub fn set_type(&mut self, name: &str, vtype: CoefType) -> Result<(), ValidationError> {
        let j = self.position(name)?;
        self.vtype[j] = vtype;
        Ok(())
    }

    pub fn set_l0_reg(&mut self, name: &str, flag: bool) -> Result<(), ValidationError> {
        let j = self.position(name)?;
        self.l0_reg[j] = flag;
        Ok(())
    }

    pub fn set_l1_reg(&mut self, name: &str, flag: bool) -> Result<(), ValidationError> {
        let j = self.position(name)?;
        self.l1_reg[j] = flag;
        Ok(())
    }

    pub fn ub_values(&self) -> &[f64] {
        &self.ub
    }

    pub fn lb_values(&self) -> &[f64] {
        &self.lb
    }

    pub fn types(&self) -> &[CoefType] {
        &self.vtype
    }

    pub fn l0_reg_ind(&self) -> &[bool] {
        &self.l0_reg
    }

    pub fn l1_reg_ind(&self) -> &[bool] {
        &self.l1_reg
    }

    /// Iterate over entries in column order
    pub fn iter(&self) -> impl Iterator<Item = CoefficientView<'_>> + '_ {
        (0..self.len()).map(move |j| CoefficientView {
            index: j,
            name: &self.names[j],
            lb: self.lb[j],
            ub: self.ub[j],
            vtype: self.vtype[j],
            l0_reg: self.l0_reg[j],
            l1_reg: self.l1_reg[j],
        })
    }
}

fn check_bounds(name: &str, lb: f64, ub: f64) -> Result<(), ValidationError> {
    for value in [lb, ub] {
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteBound {
                name: name.to_string(),
                value,
            });
        }
    }
    if ub < lb {
        return Err(ValidationError::InvalidBounds {
            name: name.to_string(),
            lb,
            ub,
        });
    }
    Ok(())
}
