//! Command-line argument definitions using clap

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::pipeline::solver::{SlimConfig, SolverConfig};

/// slimip - Build, solve and verify SLIM scoring systems as Mixed-Integer Programs
#[derive(Parser, Debug)]
#[command(name = "slimip")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Also write log lines to this file
    #[arg(long, global = true)]
    pub log: Option<PathBuf>,

    /// Suppress logging to stderr
    #[arg(long, global = true, default_value = "false")]
    pub silent: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a SLIM formulation from a CSV file and save it as MPS plus a JSON index map
    Create(CreateArgs),

    /// Solve a saved formulation, verify the solution and print the scorecard
    Solve(SolveArgs),

    /// Build and solve in one go, without going through an MPS file
    Fit(FitArgs),
}

/// Training data and formulation parameters shared by `create` and `fit`
#[derive(Args, Debug, Clone)]
pub struct FormulationArgs {
    /// CSV file with training data; the first column is the outcome (0/1 or -1/+1)
    #[arg(long, value_parser = validate_csv_file)]
    pub data_file: PathBuf,

    /// Column containing positive sample weights (excluded from the features)
    #[arg(short = 'w', long)]
    pub weight_column: Option<String>,

    /// Maximum number of non-zero coefficients, intercept excluded.
    /// Defaults to no limit.
    #[arg(long, value_parser = validate_max_size)]
    pub max_size: Option<usize>,

    /// Coefficients are integers in [-max_coef, max_coef]
    #[arg(long, default_value = "10", value_parser = validate_positive)]
    pub max_coef: f64,

    /// Intercept is bounded by [-max_offset, max_offset].
    /// Defaults to a range computed from the data.
    #[arg(long, value_parser = validate_positive)]
    pub max_offset: Option<f64>,

    /// L0 penalty per non-zero coefficient (values above 1 are clipped).
    /// Defaults to 0.9 / (N * P).
    #[arg(long, value_parser = validate_positive)]
    pub c0_value: Option<f64>,

    /// L1 penalty on coefficient magnitudes; 0 disables it.
    /// Defaults to a tie-breaking value below one unit of the L0 penalty.
    #[arg(long, value_parser = validate_non_negative)]
    pub c1_value: Option<f64>,

    /// Minimum margin for a sample to count as correctly classified
    #[arg(long, default_value = "0.001", value_parser = validate_positive)]
    pub epsilon: f64,
}

impl FormulationArgs {
    pub fn slim_config(&self) -> SlimConfig {
        SlimConfig {
            max_coef: self.max_coef,
            max_offset: self.max_offset,
            c0: self.c0_value,
            c1: self.c1_value,
            epsilon: self.epsilon,
            l0_max: self.max_size,
            ..SlimConfig::default()
        }
    }
}

/// Solver parameters shared by `solve` and `fit`
#[derive(Args, Debug, Clone)]
pub struct SolverArgs {
    /// Time limit on training in seconds; -1 for no time limit
    #[arg(long, default_value = "300", allow_hyphen_values = true, value_parser = validate_timelimit)]
    pub timelimit: i64,

    /// Relative MIP gap (0.0 to 1.0) at which the solver stops
    #[arg(long, default_value = "0.0", value_parser = validate_gap)]
    pub gap: f64,
}

impl SolverArgs {
    pub fn solver_config(&self) -> SolverConfig {
        SolverConfig {
            timeout_seconds: u64::try_from(self.timelimit).ok(),
            gap_tolerance: self.gap,
            ..SolverConfig::default()
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct CreateArgs {
    #[command(flatten)]
    pub formulation: FormulationArgs,

    /// MPS file to write the formulation to
    #[arg(long, value_parser = validate_mps_file)]
    pub instance_file: PathBuf,

    /// JSON file to write the index map to.
    /// Defaults to the instance file with a .json extension.
    #[arg(long, value_parser = validate_json_file)]
    pub instance_info: Option<PathBuf>,
}

impl CreateArgs {
    pub fn instance_info_path(&self) -> PathBuf {
        self.instance_info
            .clone()
            .unwrap_or_else(|| self.instance_file.with_extension("json"))
    }
}

#[derive(Args, Debug, Clone)]
pub struct SolveArgs {
    /// CSV file with the training data the formulation was built from
    #[arg(long, value_parser = validate_csv_file)]
    pub data_file: PathBuf,

    /// Column containing sample weights, as used when creating the formulation
    #[arg(short = 'w', long)]
    pub weight_column: Option<String>,

    /// MPS file holding the formulation
    #[arg(long, value_parser = validate_mps_file)]
    pub instance_file: PathBuf,

    /// JSON index map written alongside the MPS file
    #[arg(long, value_parser = validate_json_file)]
    pub instance_info: PathBuf,

    #[command(flatten)]
    pub solver: SolverArgs,

    /// Write the run record to this JSON file
    #[arg(long, value_parser = validate_json_file)]
    pub results: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct FitArgs {
    #[command(flatten)]
    pub formulation: FormulationArgs,

    #[command(flatten)]
    pub solver: SolverArgs,

    /// Also save the formulation to this MPS file
    #[arg(long, value_parser = validate_mps_file)]
    pub instance_file: Option<PathBuf>,

    /// Write the run record to this JSON file
    #[arg(long, value_parser = validate_json_file)]
    pub results: Option<PathBuf>,
}

fn has_extension(path: &Path, expected: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(expected))
}

fn validate_extension(s: &str, expected: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    if has_extension(&path, expected) {
        Ok(path)
    } else {
        Err(format!("'{}' must end in .{}", s, expected))
    }
}

/// Validator for CSV input files
fn validate_csv_file(s: &str) -> Result<PathBuf, String> {
    validate_extension(s, "csv")
}

/// Validator for MPS instance files
fn validate_mps_file(s: &str) -> Result<PathBuf, String> {
    validate_extension(s, "mps")
}

/// Validator for JSON files
fn validate_json_file(s: &str) -> Result<PathBuf, String> {
    validate_extension(s, "json")
}

/// Validator for max_size parameter
fn validate_max_size(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid count", s))?;

    if value < 1 {
        Err(format!("max_size must be at least 1, got {}", value))
    } else {
        Ok(value)
    }
}

/// Validator for strictly positive reals
fn validate_positive(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(format!("value must be positive, got {}", value))
    }
}

/// Validator for non-negative reals
fn validate_non_negative(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("value must be non-negative, got {}", value))
    }
}

/// Validator for timelimit parameter
fn validate_timelimit(s: &str) -> Result<i64, String> {
    let value: i64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid integer", s))?;

    if value == -1 || value >= 1 {
        Ok(value)
    } else {
        Err(format!("timelimit must be -1 or >= 1, got {}", value))
    }
}

/// Validator for gap parameter
fn validate_gap(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if !(0.0..=1.0).contains(&value) {
        Err(format!("gap must be between 0.0 and 1.0, got {}", value))
    } else {
        Ok(value)
    }
}
