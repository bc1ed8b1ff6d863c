//! SLIM as a Mixed Integer Program
//!
//! Builds the SLIM formulation from a dataset and a coefficient set, solves
//! it with HiGHS via good_lp, and checks the solver's assignment against every
//! modeled invariant. The formulation itself is solver-agnostic (`MipSpec`)
//! and can be written to free-format MPS for any other MIP solver.

pub mod bounds;
pub mod formulation;
pub mod info;
mod model;
pub mod mps;
pub mod problem;
pub mod verify;

use serde::{Deserialize, Serialize};

pub use bounds::prepare_coefficients;
pub use formulation::{build_formulation, Formulation};
pub use info::{CountBounds, GroupRange, SlimInfo, VarGroup, VariableLayout};
pub use model::solve_formulation;
pub use problem::{Domain, LinearConstraint, MipSpec, Objective, ObjectiveSense, Sense, VariableSpec};
pub use verify::{assignment_from_coefficients, verify_solution, VerifiedSolution};

/// Parameters of the SLIM formulation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlimConfig {
    /// Coefficients are bounded by `[-max_coef, max_coef]`
    pub max_coef: f64,
    /// Intercept bound; `None` computes the range from the data
    pub max_offset: Option<f64>,
    /// L0 penalty; `None` uses `0.9 / (N * P)`, user values are clipped to 1
    pub c0: Option<f64>,
    /// L1 penalty; `None` uses the tie-breaking default, `Some(0.0)` disables it
    pub c1: Option<f64>,
    /// Minimum margin for a sample to count as correctly classified
    pub epsilon: f64,
    pub w_pos: f64,
    pub w_neg: f64,
    pub l0_min: usize,
    /// Model size limit; `None` allows every L0-eligible coefficient
    pub l0_max: Option<usize>,
    /// Error budgets as fractions of `N`, `N_pos` and `N_neg`
    pub err_min: f64,
    pub err_max: f64,
    pub pos_err_min: f64,
    pub pos_err_max: f64,
    pub neg_err_min: f64,
    pub neg_err_max: f64,
}

impl Default for SlimConfig {
    fn default() -> Self {
        Self {
            max_coef: 10.0,
            max_offset: None,
            c0: None,
            c1: None,
            epsilon: 0.001,
            w_pos: 1.0,
            w_neg: 1.0,
            l0_min: 0,
            l0_max: None,
            err_min: 0.0,
            err_max: 1.0,
            pos_err_min: 0.0,
            pos_err_max: 1.0,
            neg_err_min: 0.0,
            neg_err_max: 1.0,
        }
    }
}

/// Configuration for the MIP solver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Maximum time allowed for the solver (seconds); `None` means no limit
    pub timeout_seconds: Option<u64>,
    /// Relative MIP gap - solver stops when gap falls below this
    pub gap_tolerance: f64,
    pub random_seed: i32,
    pub threads: i32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: Some(300),
            gap_tolerance: 0.0,
            random_seed: 0,
            threads: 1,
        }
    }
}

/// How a solve that produced an assignment ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// Proven optimal within the gap tolerance
    Optimal,
    /// Time limit reached with an incumbent
    TimeLimit,
    /// Stopped on the relative gap limit
    GapLimit,
}

impl SolveStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::TimeLimit => "time_limit",
            SolveStatus::GapLimit => "gap_limit",
        }
    }
}

/// Values returned by a successful solve
#[derive(Debug, Clone, PartialEq)]
pub struct SolverResult {
    pub status: SolveStatus,
    /// One value per variable, in `MipSpec` order
    pub values: Vec<f64>,
    pub objective_value: f64,
    /// Time taken to solve (milliseconds)
    pub solve_time_ms: u64,
}

/// What the solver reported. Every variant is a valid result.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    Solved(SolverResult),
    Infeasible,
    Unbounded,
    NoSolution(String),
}

impl SolveOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            SolveOutcome::Solved(result) => result.status.as_str(),
            SolveOutcome::Infeasible => "infeasible",
            SolveOutcome::Unbounded => "unbounded",
            SolveOutcome::NoSolution(_) => "no_solution",
        }
    }

    pub fn result(&self) -> Option<&SolverResult> {
        match self {
            SolveOutcome::Solved(result) => Some(result),
            _ => None,
        }
    }
}
