//! `solve` and `fit`: solve a formulation, verify and report

use std::path::Path;
use std::time::Instant;

use anyhow::{bail, Result};
use log::{error, info, warn};

use crate::pipeline::dataset::Dataset;
use crate::pipeline::loader::{display_dataset_stats, load_dataset};
use crate::pipeline::solver::mps::load_mps;
use crate::pipeline::solver::{
    solve_formulation, verify_solution, MipSpec, SlimConfig, SlimInfo, SolveOutcome, SolveStatus,
    SolverConfig,
};
use crate::report::{export_results, summarize, ExportParams, ModelSummary};
use crate::utils::{
    create_spinner, finish_with_success, finish_with_warning, print_banner, print_completion,
    print_config, print_failure, print_info, print_saved, print_step_header, print_step_time,
    print_success, ConfigLine,
};

use super::args::{FitArgs, SolveArgs, SolverArgs};
use super::create::{build_step, load_step, parameter_lines, save_instance};

/// Run the `solve` subcommand
pub fn run_solve(args: &SolveArgs) -> Result<()> {
    let solver_config = args.solver.solver_config();

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(
        &[
            ConfigLine::path("Data", &args.data_file),
            ConfigLine::path("MPS", &args.instance_file),
            ConfigLine::path("Info", &args.instance_info),
        ],
        &solver_lines(&args.solver),
    );
    info!("running 'solve' in {}", std::env::current_dir()?.display());

    print_step_header(1, "Load Instance");
    let step_start = Instant::now();
    let spinner = create_spinner("Reading MPS file and index map...");
    let spec = load_mps(&args.instance_file)?;
    let slim_info = SlimInfo::load_json(&args.instance_info)?;
    if spec.num_variables() != slim_info.n_variables() {
        bail!(
            "{} declares {} variables but the index map expects {}",
            args.instance_file.display(),
            spec.num_variables(),
            slim_info.n_variables()
        );
    }
    finish_with_success(
        &spinner,
        &format!(
            "Instance loaded: {} variables, {} constraints",
            spec.num_variables(),
            spec.num_constraints()
        ),
    );
    let dataset = load_dataset(&args.data_file, args.weight_column.as_deref())?;
    display_dataset_stats(&dataset);
    print_step_time(step_start.elapsed());

    let data_file = args.data_file.to_string_lossy();
    let instance_file = args.instance_file.to_string_lossy();
    let params = ExportParams {
        data_file: &data_file,
        instance_file: Some(&*instance_file),
        weight_column: args.weight_column.as_deref(),
        slim_config: None,
        solver_config: &solver_config,
    };
    solve_and_report(&spec, &slim_info, &dataset, &params, args.results.as_deref())
}

/// Run the `fit` subcommand
pub fn run_fit(args: &FitArgs) -> Result<()> {
    let slim_config: SlimConfig = args.formulation.slim_config();
    let solver_config = args.solver.solver_config();

    print_banner(env!("CARGO_PKG_VERSION"));
    let mut parameters = parameter_lines(&args.formulation);
    parameters.extend(solver_lines(&args.solver));
    print_config(&[ConfigLine::path("Data", &args.formulation.data_file)], &parameters);
    info!("running 'fit' in {}", std::env::current_dir()?.display());

    print_step_header(1, "Load Training Data");
    let dataset = load_step(&args.formulation)?;

    print_step_header(2, "Build Formulation");
    let formulation = build_step(&dataset, slim_config)?;
    if let Some(mps_path) = &args.instance_file {
        save_instance(&formulation, mps_path, &mps_path.with_extension("json"))?;
    }

    let data_file = args.formulation.data_file.to_string_lossy();
    let instance_file = args.instance_file.as_ref().map(|p| p.to_string_lossy());
    let params = ExportParams {
        data_file: &data_file,
        instance_file: instance_file.as_deref(),
        weight_column: args.formulation.weight_column.as_deref(),
        slim_config: Some(&slim_config),
        solver_config: &solver_config,
    };
    solve_and_report(
        &formulation.spec,
        &formulation.info,
        &dataset,
        &params,
        args.results.as_deref(),
    )
}

/// Solve, verify, summarize and optionally export
///
/// Non-success solver statuses are reported and exported but are not
/// errors. A verification failure is exported and then returned as an error.
fn solve_and_report(
    spec: &MipSpec,
    slim_info: &SlimInfo,
    dataset: &Dataset,
    params: &ExportParams,
    results_path: Option<&Path>,
) -> Result<()> {
    print_step_header(3, "Solve");
    let step_start = Instant::now();
    let spinner = create_spinner("Solving with HiGHS...");
    let outcome = solve_formulation(spec, params.solver_config)?;
    match &outcome {
        SolveOutcome::Solved(result) if result.status == SolveStatus::Optimal => {
            finish_with_success(
                &spinner,
                &format!("Solved: objective value {:.6}", result.objective_value),
            )
        }
        SolveOutcome::Solved(result) => finish_with_warning(
            &spinner,
            &format!(
                "Solver status: {}, best objective value {:.6}",
                result.status.as_str(),
                result.objective_value
            ),
        ),
        other => finish_with_warning(&spinner, &format!("Solver status: {}", other.status())),
    }
    print_step_time(step_start.elapsed());

    let Some(result) = outcome.result() else {
        if let SolveOutcome::NoSolution(message) = &outcome {
            print_info(message);
        }
        warn!("no solution to verify (status: {})", outcome.status());
        export(&outcome, None, false, results_path, params)?;
        return Ok(());
    };

    print_step_header(4, "Verify Solution");
    let verified = match verify_solution(&result.values, slim_info, dataset) {
        Ok(verified) => verified,
        Err(e) => {
            error!("solution failed verification: {}", e);
            print_failure(&format!("Verification failed: {}", e));
            export(&outcome, None, false, results_path, params)?;
            return Err(e.into());
        }
    };
    print_success(&format!(
        "All invariants hold ({} mistakes, model size {})",
        verified.total_error, verified.l0_norm
    ));

    let summary = summarize(&verified.rho, dataset, slim_info);
    summary.display();
    export(&outcome, Some(&summary), true, results_path, params)?;

    print_completion("SLIM model trained!");
    Ok(())
}

fn export(
    outcome: &SolveOutcome,
    summary: Option<&ModelSummary>,
    verified: bool,
    results_path: Option<&Path>,
    params: &ExportParams,
) -> Result<()> {
    if let Some(path) = results_path {
        export_results(outcome, summary, verified, path, params)?;
        info!("saved results to file: {}", path.display());
        print_saved("Results saved to", path);
    }
    Ok(())
}

fn solver_lines(args: &SolverArgs) -> Vec<ConfigLine> {
    let config: SolverConfig = args.solver_config();
    vec![
        ConfigLine::new(
            "Time limit",
            config
                .timeout_seconds
                .map_or_else(|| "none".to_string(), |s| format!("{}s", s)),
        ),
        ConfigLine::new("MIP gap", config.gap_tolerance),
    ]
}
