//! MIP model translation and solving
//!
//! Turns a solver-agnostic `MipSpec` into a good_lp problem, solves it with
//! HiGHS and reads the assignment back in variable declaration order.

use std::time::Instant;

use anyhow::Result;
use good_lp::{
    constraint, default_solver, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolutionStatus, SolverModel, Variable,
};
use log::{debug, info, warn};

use super::problem::{Domain, MipSpec, ObjectiveSense, Sense};
use super::{SolveOutcome, SolveStatus, SolverConfig, SolverResult};

/// Integral values within this distance of an integer are snapped to it
const INTEGRALITY_SNAP: f64 = 1e-6;

/// Solve `spec` with HiGHS
///
/// # Arguments
/// * `spec` - The formulation to solve
/// * `config` - Solver configuration (time limit, gap tolerance, seed, threads)
///
/// # Returns
/// The solver outcome. Infeasible, unbounded and failed solves are reported
/// as outcomes rather than errors.
pub fn solve_formulation(spec: &MipSpec, config: &SolverConfig) -> Result<SolveOutcome> {
    let start_time = Instant::now();
    info!(
        "solving '{}' with HiGHS: {} variables, {} constraints",
        spec.name,
        spec.num_variables(),
        spec.num_constraints()
    );

    let mut vars = ProblemVariables::new();
    let columns: Vec<Variable> = spec
        .variables
        .iter()
        .map(|v| {
            let mut def = variable().name(v.name.clone());
            def = match v.domain {
                Domain::Binary => def.binary(),
                Domain::Integer => def.integer(),
                Domain::Continuous => def,
            };
            if v.lower.is_finite() {
                def = def.min(v.lower);
            }
            if v.upper.is_finite() {
                def = def.max(v.upper);
            }
            vars.add(def)
        })
        .collect();

    let objective = linear_expression(&spec.objective.terms, &columns);
    let mut problem = match spec.objective.sense {
        ObjectiveSense::Minimize => vars.minimise(objective),
        ObjectiveSense::Maximize => vars.maximise(objective),
    }
    .using(default_solver);

    if let Some(seconds) = config.timeout_seconds {
        problem = problem.set_option("time_limit", seconds as f64);
    }
    problem = problem
        .set_option("mip_rel_gap", config.gap_tolerance)
        .set_option("random_seed", config.random_seed)
        .set_option("threads", config.threads);

    for row in &spec.constraints {
        let lhs = linear_expression(&row.terms, &columns);
        problem = match row.sense {
            Sense::Le => problem.with(constraint!(lhs <= row.rhs)),
            Sense::Ge => problem.with(constraint!(lhs >= row.rhs)),
            Sense::Eq => problem.with(constraint!(lhs == row.rhs)),
        };
    }

    let solution = match problem.solve() {
        Ok(solution) => solution,
        Err(ResolutionError::Infeasible) => {
            warn!("HiGHS reports the formulation is infeasible");
            return Ok(SolveOutcome::Infeasible);
        }
        Err(ResolutionError::Unbounded) => {
            warn!("HiGHS reports the formulation is unbounded");
            return Ok(SolveOutcome::Unbounded);
        }
        Err(e) => {
            warn!("HiGHS returned no solution: {}", e);
            return Ok(SolveOutcome::NoSolution(e.to_string()));
        }
    };

    let status = solve_status(solution.status());
    if status != SolveStatus::Optimal {
        warn!("HiGHS stopped early ({}), the incumbent may not be optimal", status.as_str());
    }

    let values: Vec<f64> = spec
        .variables
        .iter()
        .zip(&columns)
        .map(|(v, &col)| {
            let value = solution.value(col);
            if v.domain.is_integral() {
                snap_integral(value)
            } else {
                value
            }
        })
        .collect();

    let objective_value = spec.objective_value(&values);
    let solve_time_ms = start_time.elapsed().as_millis() as u64;
    debug!(
        "objective value {} found in {} ms",
        objective_value, solve_time_ms
    );

    Ok(SolveOutcome::Solved(SolverResult {
        status,
        values,
        objective_value,
        solve_time_ms,
    }))
}

fn solve_status(status: SolutionStatus) -> SolveStatus {
    match status {
        SolutionStatus::Optimal => SolveStatus::Optimal,
        SolutionStatus::TimeLimit => SolveStatus::TimeLimit,
        SolutionStatus::GapLimit => SolveStatus::GapLimit,
    }
}

fn linear_expression(terms: &[(usize, f64)], columns: &[Variable]) -> Expression {
    terms.iter().map(|&(k, coef)| coef * columns[k]).sum()
}

fn snap_integral(value: f64) -> f64 {
    let rounded = value.round();
    if (value - rounded).abs() <= INTEGRALITY_SNAP {
        rounded
    } else {
        value
    }
}
