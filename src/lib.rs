//! slimip: SLIM scoring systems as Mixed-Integer Programs
//!
//! A library for building the SLIM formulation (Supersparse Linear Integer
//! Models) from binary classification data, solving it with HiGHS, verifying
//! every modeled invariant on the solution and rendering the resulting
//! point system as a scorecard.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod utils;
