//! `create`: build a SLIM formulation and save it to disk

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use log::info;

use crate::pipeline::dataset::Dataset;
use crate::pipeline::loader::{display_dataset_stats, load_dataset};
use crate::pipeline::solver::mps::save_mps;
use crate::pipeline::solver::{build_formulation, prepare_coefficients, Formulation, SlimConfig};
use crate::utils::{
    create_spinner, finish_with_success, print_banner, print_completion, print_config,
    print_saved, print_step_header, print_step_time, print_success, ConfigLine,
};

use super::args::{CreateArgs, FormulationArgs};

/// Run the `create` subcommand
pub fn run_create(args: &CreateArgs) -> Result<()> {
    let info_path = args.instance_info_path();
    let config = args.formulation.slim_config();

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(
        &[
            ConfigLine::path("Data", &args.formulation.data_file),
            ConfigLine::path("MPS", &args.instance_file),
            ConfigLine::path("Info", &info_path),
        ],
        &parameter_lines(&args.formulation),
    );
    info!("running 'create' in {}", std::env::current_dir()?.display());

    print_step_header(1, "Load Training Data");
    let dataset = load_step(&args.formulation)?;

    print_step_header(2, "Build Formulation");
    let formulation = build_step(&dataset, config)?;

    print_step_header(3, "Save Instance");
    let step_start = Instant::now();
    save_instance(&formulation, &args.instance_file, &info_path)?;
    print_step_time(step_start.elapsed());

    print_completion("SLIM instance created!");
    Ok(())
}

/// Load the training data with a spinner
pub(crate) fn load_step(args: &FormulationArgs) -> Result<Dataset> {
    let step_start = Instant::now();
    let spinner = create_spinner("Loading CSV...");
    let dataset = load_dataset(&args.data_file, args.weight_column.as_deref())?;
    finish_with_success(&spinner, "Dataset loaded");
    display_dataset_stats(&dataset);
    print_step_time(step_start.elapsed());
    Ok(dataset)
}

/// Build the default coefficient set and the formulation with a spinner
pub(crate) fn build_step(dataset: &Dataset, config: SlimConfig) -> Result<Formulation> {
    let step_start = Instant::now();
    let spinner = create_spinner("Building SLIM formulation...");
    let coefs = prepare_coefficients(dataset, &config)
        .context("Failed to prepare the coefficient set")?;
    let formulation =
        build_formulation(dataset, &coefs, config).context("Failed to build the formulation")?;
    finish_with_success(
        &spinner,
        &format!(
            "Formulation built: {} variables, {} constraints",
            formulation.spec.num_variables(),
            formulation.spec.num_constraints()
        ),
    );
    println!(
        "      C0 = {:.6}, C1 = {:.6}, model size <= {}",
        formulation.info.c0, formulation.info.c1, formulation.info.l0_max
    );
    print_step_time(step_start.elapsed());
    Ok(formulation)
}

/// Write the MPS file and the JSON index map
pub(crate) fn save_instance(formulation: &Formulation, mps_path: &Path, info_path: &Path) -> Result<()> {
    save_mps(&formulation.spec, mps_path)?;
    info!("saved SLIM IP to file: {}", mps_path.display());
    print_saved("Instance saved to", mps_path);

    formulation.info.save_json(info_path)?;
    info!("saved SLIM info to file: {}", info_path.display());
    print_saved("Index map saved to", info_path);
    print_success("Instance written");
    Ok(())
}

pub(crate) fn parameter_lines(args: &FormulationArgs) -> Vec<ConfigLine> {
    let or_default = |value: Option<f64>| value.map_or_else(|| "auto".to_string(), |v| v.to_string());
    vec![
        ConfigLine::new("Max coefficient", args.max_coef),
        ConfigLine::new("Max offset", or_default(args.max_offset)),
        ConfigLine::new(
            "Max size",
            args.max_size.map_or_else(|| "unlimited".to_string(), |v| v.to_string()),
        ),
        ConfigLine::new("C0", or_default(args.c0_value)),
        ConfigLine::new("C1", or_default(args.c1_value)),
        ConfigLine::new("Epsilon", args.epsilon),
    ]
}
