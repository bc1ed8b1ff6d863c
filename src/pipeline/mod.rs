//! Pipeline module - data ingestion, coefficient constraints and the SLIM MIP

pub mod coefficients;
pub mod dataset;
pub mod error;
pub mod loader;
pub mod solver;
pub mod weights;

pub use coefficients::{CoefType, CoefficientSet, CoefficientView};
pub use dataset::{Dataset, INTERCEPT_NAME};
pub use error::{FormulationError, Invariant, ValidationError, VerificationError};
pub use loader::*;
pub use solver::{SlimConfig, SolveOutcome, SolveStatus, SolverConfig};
pub use weights::*;
