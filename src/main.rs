//! slimip: SLIM scoring system CLI tool
//!
//! Creates SLIM instances as MPS files, solves them with HiGHS and prints
//! the verified scorecard.

use anyhow::Result;
use clap::Parser;

use slimip::cli::{run_create, run_fit, run_solve, Cli, Commands};
use slimip::utils::init_logging;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log.as_deref(), cli.silent)?;

    match &cli.command {
        Commands::Create(args) => run_create(args),
        Commands::Solve(args) => run_solve(args),
        Commands::Fit(args) => run_fit(args),
    }
}
