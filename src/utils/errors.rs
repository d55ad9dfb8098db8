//! Error types for the lexicographic optimizer.
//!
//! Every failure is terminal for the call that raised it: there is no
//! retry or partial-result salvage, and all owned inputs are released on
//! the error path. Infeasibility (a domain point with no image) is
//! never an error; it is reported as a region value.

use crate::frontend::ParseError;
use crate::solver::SolverError;
use thiserror::Error;

/// Top-level error type for the optimizer.
#[derive(Error, Debug)]
pub enum PolyLexError {
    /// The relation and its domain have unnamed parameter tuples that do
    /// not already match, so no correspondence can be inferred.
    #[error("unaligned unnamed parameters")]
    UnalignedParams,

    /// The arguments of an operation live in incompatible spaces.
    #[error("space mismatch: {0}")]
    SpaceMismatch(String),

    /// Error while parsing set/relation notation.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Failure reported by the per-piece solver, propagated unchanged.
    #[error("solver error: {0}")]
    Solver(#[from] SolverError),

    /// Internal invariant violation.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type using [`PolyLexError`].
pub type PolyLexResult<T> = Result<T, PolyLexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = PolyLexError::UnalignedParams;
        assert_eq!(err.to_string(), "unaligned unnamed parameters");

        let err = PolyLexError::SpaceMismatch("domain has 2 dims, relation expects 1".into());
        assert!(err.to_string().contains("space mismatch"));
    }
}
