//! Error types for dataset validation, formulation and solution verification.
//!
//! Each enum corresponds to one failure category:
//! - [`ValidationError`]: the caller supplied a malformed dataset or
//!   coefficient set and must fix the input.
//! - [`FormulationError`]: bounds or budgets are internally inconsistent; the
//!   formulation is aborted before any solver call.
//! - [`VerificationError`]: a solved assignment violates a modeled invariant.

use std::fmt;

use thiserror::Error;

use super::solver::VarGroup;

/// Malformed dataset or coefficient set.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("dataset must contain at least one sample")]
    EmptyDataset,

    #[error("dataset must contain at least one variable")]
    NoVariables,

    #[error("dimension mismatch: {what} has {actual} entries, expected {expected}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("variable names are not unique: '{0}' appears more than once")]
    DuplicateName(String),

    #[error("X[{row}, {col}] is not finite ({value})")]
    NonFiniteFeature { row: usize, col: usize, value: f64 },

    #[error("Y[{index}] = {value}, labels must be -1 or +1")]
    InvalidLabel { index: usize, value: f64 },

    #[error("sample weight {index} must be positive and finite, got {value}")]
    InvalidWeight { index: usize, value: f64 },

    #[error("'(Intercept)' column must contain only 1s (row {row} has {value})")]
    InterceptNotOnes { row: usize, value: f64 },

    #[error("column '{column}' has a missing value in row {row}")]
    MissingValue { column: String, row: usize },

    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("invalid bounds for '{name}': ub = {ub} < lb = {lb}")]
    InvalidBounds { name: String, lb: f64, ub: f64 },

    #[error("bound for '{name}' must be finite, got {value}")]
    NonFiniteBound { name: String, value: f64 },
}

/// Internally inconsistent bounds or budgets.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulationError {
    #[error("coefficient set has {actual} variables but the dataset has {expected} columns")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("coefficient {index} is '{actual}' but dataset column {index} is '{expected}'")]
    NameMismatch {
        index: usize,
        expected: String,
        actual: String,
    },

    #[error("coefficient '{name}' has an empty box: lb = {lb} > ub = {ub}")]
    EmptyBox { name: String, lb: f64, ub: f64 },

    #[error("parameter {name} = {value} is out of range ({requirement})")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        requirement: &'static str,
    },

    #[error("L0 budget is empty after clipping: L0_min = {min} > L0_max = {max}")]
    EmptyL0Budget { min: usize, max: usize },

    #[error("{forced} coefficient(s) exclude 0 from their box but L0_max = {l0_max}")]
    ForcedNonzero { forced: usize, l0_max: usize },

    #[error("{which} budget is empty after clipping: [{min}, {max}]")]
    EmptyErrorBudget {
        which: &'static str,
        min: usize,
        max: usize,
    },

    #[error("index map field {field} has length {actual}, expected {expected}")]
    FieldLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("index map field {field} refers to coefficient {index} but there are {n_coefficients}")]
    CoefficientOutOfRange {
        field: &'static str,
        index: usize,
        n_coefficients: usize,
    },

    #[error("index map layout does not lay the variable groups out back to back")]
    NonContiguousLayout,
}

/// The invariant a verification check enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invariant {
    RhoUpperBound,
    RhoLowerBound,
    RhoIntegral,
    AlphaBinary,
    AlphaZeroImpliesRhoZero,
    NonzeroRhoImpliesAlpha,
    BetaEqualsAbsRho,
    BetaUpperBound,
    BetaLowerBound,
    L0NormEqualsAlphaSum,
    L0NormEqualsCardinality,
    L0NormLowerBudget,
    L0NormUpperBudget,
    ErrorBinary,
    ErrorLinking,
    TotalErrorSum,
    TotalErrorPosSum,
    TotalErrorNegSum,
    TotalErrorSplit,
    ErrorLowerBudget,
    ErrorUpperBudget,
    BigMCoversScore,
}

impl fmt::Display for Invariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Invariant::RhoUpperBound => "rho <= ub",
            Invariant::RhoLowerBound => "rho >= lb",
            Invariant::RhoIntegral => "rho is integral for integer coefficients",
            Invariant::AlphaBinary => "alpha is binary",
            Invariant::AlphaZeroImpliesRhoZero => "alpha = 0 => rho = 0",
            Invariant::NonzeroRhoImpliesAlpha => "rho != 0 => alpha = 1",
            Invariant::BetaEqualsAbsRho => "beta = |rho|",
            Invariant::BetaUpperBound => "beta <= beta_ub",
            Invariant::BetaLowerBound => "beta >= beta_lb",
            Invariant::L0NormEqualsAlphaSum => "total_l0_norm = sum(alpha)",
            Invariant::L0NormEqualsCardinality => "total_l0_norm = count_nonzero(rho[L0])",
            Invariant::L0NormLowerBudget => "total_l0_norm >= L0_min",
            Invariant::L0NormUpperBudget => "total_l0_norm <= L0_max",
            Invariant::ErrorBinary => "err is binary",
            Invariant::ErrorLinking => "err = 1[score < epsilon]",
            Invariant::TotalErrorSum => "total_error = sum(err)",
            Invariant::TotalErrorPosSum => "total_error_pos = sum(err[pos])",
            Invariant::TotalErrorNegSum => "total_error_neg = sum(err[neg])",
            Invariant::TotalErrorSplit => "total_error = total_error_pos + total_error_neg",
            Invariant::ErrorLowerBudget => "error count >= budget minimum",
            Invariant::ErrorUpperBudget => "error count <= budget maximum",
            Invariant::BigMCoversScore => "-score <= M",
        };
        f.write_str(text)
    }
}

/// A solved assignment that violates a modeled invariant.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VerificationError {
    #[error("assignment has {actual} values but the formulation declares {expected} variables")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("dataset is {actual_rows}x{actual_cols} but the formulation was built for {expected_rows}x{expected_cols}")]
    DatasetMismatch {
        expected_rows: usize,
        expected_cols: usize,
        actual_rows: usize,
        actual_cols: usize,
    },

    #[error("{group}[{index}] violates '{invariant}': expected {expected}, observed {observed}")]
    Violation {
        group: VarGroup,
        index: usize,
        invariant: Invariant,
        expected: f64,
        observed: f64,
    },
}

impl VerificationError {
    /// The violated invariant, if this is a per-variable violation.
    pub fn invariant(&self) -> Option<Invariant> {
        match self {
            VerificationError::Violation { invariant, .. } => Some(*invariant),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_message_names_group_index_and_values() {
        let err = VerificationError::Violation {
            group: VarGroup::Beta,
            index: 2,
            invariant: Invariant::BetaEqualsAbsRho,
            expected: 3.0,
            observed: 2.5,
        };
        let msg = err.to_string();
        assert!(msg.contains("beta[2]"));
        assert!(msg.contains("beta = |rho|"));
        assert!(msg.contains("expected 3"));
        assert!(msg.contains("observed 2.5"));
        assert_eq!(err.invariant(), Some(Invariant::BetaEqualsAbsRho));
    }

    #[test]
    fn test_validation_message() {
        let err = ValidationError::InvalidBounds {
            name: "age".to_string(),
            lb: 2.0,
            ub: 1.0,
        };
        assert_eq!(err.to_string(), "invalid bounds for 'age': ub = 1 < lb = 2");
    }
}
