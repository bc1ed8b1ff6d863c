//! Solve result export

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::pipeline::solver::{SlimConfig, SolveOutcome, SolverConfig};

use super::summary::ModelSummary;

/// Metadata about the run
#[derive(Debug, Serialize)]
pub struct RunMetadata {
    /// Timestamp of the run (ISO 8601 format)
    pub timestamp: String,
    pub slimip_version: String,
    /// Training data file
    pub data_file: String,
    /// MPS file the formulation was read from or written to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_column: Option<String>,
}

/// Complete record of one solve
#[derive(Debug, Serialize)]
pub struct SlimRunExport {
    pub metadata: RunMetadata,
    /// Formulation parameters, when the formulation was built in this run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slim_config: Option<SlimConfig>,
    pub solver_config: SolverConfig,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub objective_value: Option<f64>,
    pub solve_time_ms: Option<u64>,
    /// Whether the assignment passed every invariant check
    pub verified: bool,
    pub summary: Option<ModelSummary>,
}

/// Parameters for the export metadata
pub struct ExportParams<'a> {
    pub data_file: &'a str,
    pub instance_file: Option<&'a str>,
    pub weight_column: Option<&'a str>,
    pub slim_config: Option<&'a SlimConfig>,
    pub solver_config: &'a SolverConfig,
}

impl SlimRunExport {
    pub fn new(
        outcome: &SolveOutcome,
        summary: Option<&ModelSummary>,
        verified: bool,
        params: &ExportParams,
    ) -> Self {
        let result = outcome.result();
        let message = match outcome {
            SolveOutcome::NoSolution(message) => Some(message.clone()),
            _ => None,
        };

        Self {
            metadata: RunMetadata {
                timestamp: Utc::now().to_rfc3339(),
                slimip_version: env!("CARGO_PKG_VERSION").to_string(),
                data_file: params.data_file.to_string(),
                instance_file: params.instance_file.map(String::from),
                weight_column: params.weight_column.map(String::from),
            },
            slim_config: params.slim_config.copied(),
            solver_config: params.solver_config.clone(),
            status: outcome.status().to_string(),
            message,
            objective_value: result.map(|r| r.objective_value),
            solve_time_ms: result.map(|r| r.solve_time_ms),
            verified,
            summary: summary.cloned(),
        }
    }
}

/// Export solve results to a JSON file
///
/// # Arguments
/// * `outcome` - What the solver reported
/// * `summary` - Training performance of the verified model, if any
/// * `verified` - Whether the assignment passed verification
/// * `output_path` - Path to write the JSON file
/// * `params` - Export parameters for metadata
pub fn export_results(
    outcome: &SolveOutcome,
    summary: Option<&ModelSummary>,
    verified: bool,
    output_path: &Path,
    params: &ExportParams,
) -> Result<()> {
    let export = SlimRunExport::new(outcome, summary, verified, params);

    let json = serde_json::to_string_pretty(&export)
        .context("Failed to serialize results to JSON")?;

    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write results to {}", output_path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::solver::{SolveStatus, SolverResult};

    fn params(solver_config: &SolverConfig) -> ExportParams<'_> {
        ExportParams {
            data_file: "train.csv",
            instance_file: Some("train.mps"),
            weight_column: None,
            slim_config: None,
            solver_config,
        }
    }

    #[test]
    fn test_export_solved_outcome() {
        let solver_config = SolverConfig::default();
        let outcome = SolveOutcome::Solved(SolverResult {
            status: SolveStatus::Optimal,
            values: vec![0.0, 1.0],
            objective_value: 0.25,
            solve_time_ms: 12,
        });

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        export_results(&outcome, None, true, &path, &params(&solver_config)).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["status"], "optimal");
        assert_eq!(json["objective_value"], 0.25);
        assert_eq!(json["verified"], true);
        assert_eq!(json["metadata"]["data_file"], "train.csv");
        assert!(json["metadata"].get("weight_column").is_none());
        assert!(json.get("slim_config").is_none());
    }

    #[test]
    fn test_export_time_limited_incumbent() {
        let solver_config = SolverConfig::default();
        let outcome = SolveOutcome::Solved(SolverResult {
            status: SolveStatus::TimeLimit,
            values: vec![0.0, 2.0],
            objective_value: 0.5,
            solve_time_ms: 300_000,
        });
        let export = SlimRunExport::new(&outcome, None, true, &params(&solver_config));
        assert_eq!(export.status, "time_limit");
        assert_eq!(export.objective_value, Some(0.5));
        assert!(export.message.is_none());
    }

    #[test]
    fn test_export_no_solution_keeps_message() {
        let solver_config = SolverConfig::default();
        let outcome = SolveOutcome::NoSolution("time limit".to_string());
        let export = SlimRunExport::new(&outcome, None, false, &params(&solver_config));
        assert_eq!(export.status, "no_solution");
        assert_eq!(export.message.as_deref(), Some("time limit"));
        assert!(export.objective_value.is_none());
    }
}
