//! Solver-agnostic MIP specification
//!
//! A flat list of bounded variables, a flat list of linear rows and a single
//! linear objective. This is what the formulation builder emits, what the MPS
//! writer serializes and what the solver boundary consumes.

use serde::{Deserialize, Serialize};

/// Domain of a decision variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Domain {
    Continuous,
    Integer,
    Binary,
}

impl Domain {
    pub fn is_integral(self) -> bool {
        matches!(self, Domain::Integer | Domain::Binary)
    }
}

/// Relational operator of a linear row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

impl std::fmt::Display for Sense {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sense::Le => write!(f, "<="),
            Sense::Ge => write!(f, ">="),
            Sense::Eq => write!(f, "="),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectiveSense {
    #[default]
    Minimize,
    Maximize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSpec {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
    pub domain: Domain,
}

/// `sum(coef * x[index]) (sense) rhs`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearConstraint {
    pub name: String,
    pub terms: Vec<(usize, f64)>,
    pub sense: Sense,
    pub rhs: f64,
}

impl LinearConstraint {
    /// Left-hand side evaluated at `values`
    pub fn activity(&self, values: &[f64]) -> f64 {
        self.terms.iter().map(|&(k, c)| c * values[k]).sum()
    }

    /// Amount by which `values` violates this row (0 when satisfied)
    pub fn violation(&self, values: &[f64]) -> f64 {
        let lhs = self.activity(values);
        match self.sense {
            Sense::Le => (lhs - self.rhs).max(0.0),
            Sense::Ge => (self.rhs - lhs).max(0.0),
            Sense::Eq => (lhs - self.rhs).abs(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    pub sense: ObjectiveSense,
    pub terms: Vec<(usize, f64)>,
}

/// Complete variable/constraint/objective specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MipSpec {
    pub name: String,
    pub variables: Vec<VariableSpec>,
    pub constraints: Vec<LinearConstraint>,
    pub objective: Objective,
}

impl MipSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: Vec::new(),
            constraints: Vec::new(),
            objective: Objective::default(),
        }
    }

    /// Declare a variable and return its index
    pub fn add_variable(
        &mut self,
        name: impl Into<String>,
        lower: f64,
        upper: f64,
        domain: Domain,
    ) -> usize {
        self.variables.push(VariableSpec {
            name: name.into(),
            lower,
            upper,
            domain,
        });
        self.variables.len() - 1
    }

    /// Add a row, dropping zero coefficients. Terms are kept sorted by
    /// variable index.
    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        terms: Vec<(usize, f64)>,
        sense: Sense,
        rhs: f64,
    ) {
        let mut terms: Vec<(usize, f64)> = terms.into_iter().filter(|&(_, c)| c != 0.0).collect();
        terms.sort_by_key(|&(k, _)| k);
        self.constraints.push(LinearConstraint {
            name: name.into(),
            terms,
            sense,
            rhs,
        });
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective.terms.iter().map(|&(k, c)| c * values[k]).sum()
    }

    /// Largest bound or row violation of `values`
    pub fn max_violation(&self, values: &[f64]) -> f64 {
        let bounds = self
            .variables
            .iter()
            .zip(values)
            .map(|(v, &x)| (v.lower - x).max(x - v.upper).max(0.0));
        let rows = self.constraints.iter().map(|c| c.violation(values));
        bounds.chain(rows).fold(0.0, f64::max)
    }
}
