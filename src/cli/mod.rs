//! CLI module - argument parsing and subcommand runners

mod args;
pub mod create;
pub mod solve;

pub use args::{Cli, Commands, CreateArgs, FitArgs, FormulationArgs, SolveArgs, SolverArgs};
pub use create::run_create;
pub use solve::{run_fit, run_solve};
