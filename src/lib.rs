//! # PolyLex - Exact Lexicographic Optimization over Polyhedral Relations
//!
//! For a relation between an input tuple space and an output tuple space
//! defined by linear constraints over integers (optionally with symbolic
//! parameters), this crate computes the lexicographically smallest or
//! largest output tuple for every input tuple, exactly. It is a building
//! block for polyhedral program analysis: canonical representative
//! iterations, dependence distances, "does a consistent value exist"
//! queries over loop-nest-shaped constraint systems.
//!
//! ## Architecture
//!
//! ```text
//! Notation -> Frontend -> Relation/Region values -> Lexopt Engine -> Result
//!                                                        |
//!                                                   PieceSolver
//! ```
//!
//! The engine decomposes union domains into disjoint convex pieces,
//! dispatches each piece to a per-piece solver, and composes the answers
//! into either a relation-valued or a piecewise-affine-valued optimum.
//! Domain points with no image are reported as an infeasible region, not
//! as an error.
//!
//! ## Example
//!
//! ```
//! use polylex::prelude::*;
//!
//! let rel = polylex::parse_relation("{ [x] -> [y] : 0 <= y <= 10 }")?;
//! let dom = polylex::parse_region("{ [x] : 0 <= x <= 5 or 3 <= x <= 8 }")?;
//!
//! let (optimum, infeasible) = rel.partial_lexmin(dom)?;
//! assert!(optimum.contains(&[4], &[0], &[]));
//! assert!(infeasible.is_plain_empty());
//! # Ok::<(), polylex::PolyLexError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod frontend;
pub mod lexopt;
pub mod polyhedral;
pub mod solver;
pub mod utils;

// Re-export commonly used types
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::frontend::{parse_region, parse_relation, ParseError};
    pub use crate::lexopt::{LexOptResult, OptDirection};
    pub use crate::polyhedral::{
        AffineExpr, AffinePiece, BasicRegion, BasicRelation, Constraint, ConstraintKind,
        MultiAffine, PiecewiseAffine, Region, Relation, Space,
    };
    pub use crate::solver::{BoundSolver, PieceSolution, PieceSolver, SolverError};
    pub use crate::utils::errors::{PolyLexError, PolyLexResult};
}

pub use utils::errors::{PolyLexError, PolyLexResult};

use polyhedral::{Region, Relation};

/// Parse a relation union from set/relation notation, e.g.
/// `[N] -> { [i] -> [j] : 0 <= j <= N }`.
pub fn parse_relation(source: &str) -> PolyLexResult<Relation> {
    Ok(frontend::parse_relation(source)?)
}

/// Parse a region union from set notation, e.g.
/// `{ [x] : 0 <= x <= 5 or 3 <= x <= 8 }`.
pub fn parse_region(source: &str) -> PolyLexResult<Region> {
    Ok(frontend::parse_region(source)?)
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_parse_error_propagates() {
        let err = parse_relation("{ [x] [y] }").unwrap_err();
        assert!(matches!(err, PolyLexError::Parse(_)));
    }
}
