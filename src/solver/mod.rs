//! The per-piece solver seam.
//!
//! The decomposition engine in [`crate::lexopt`] never solves anything
//! itself: it hands each convex relation piece and each disjoint convex
//! domain piece to a [`PieceSolver`] and composes the answers. The
//! solver's contract is exact: it returns the lexicographic optimum as a
//! disjoint piecewise affine value together with the sub-region of the
//! domain that has no image at all.
//!
//! [`BoundSolver`] is the baseline implementation, covering the integer
//! fragment in which every range coordinate is defined by unit-coefficient
//! bounds. Callers with other needs (rational relations, general
//! coefficients) supply their own implementation.

mod bound;

pub use bound::BoundSolver;

use crate::lexopt::OptDirection;
use crate::polyhedral::{AffinePiece, BasicRegion, BasicRelation, Region};
use thiserror::Error;

/// The exact answer for one (convex relation, convex domain) pair.
#[derive(Debug, Clone)]
pub struct PieceSolution {
    /// Disjoint sub-regions of the domain, each with the affine optimum
    /// that holds there
    pub pieces: Vec<AffinePiece>,
    /// The sub-region of the domain with no image tuple
    pub infeasible: Region,
}

/// A solver for the lexicographic optimum of a single convex relation
/// over a single convex domain region.
///
/// The domain's point set must be covered exactly once by the union of
/// the returned piece regions and the infeasible region.
pub trait PieceSolver {
    /// Compute the optimum of `rel` restricted to `dom`.
    fn solve(
        &self,
        rel: &BasicRelation,
        dom: &BasicRegion,
        dir: OptDirection,
    ) -> Result<PieceSolution, SolverError>;
}

/// Errors reported by a [`PieceSolver`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolverError {
    /// The input is outside the fragment the solver handles.
    #[error("unsupported input: {0}")]
    Unsupported(String),

    /// A range coordinate has no bound in the optimization direction, so
    /// no optimum exists.
    #[error("range coordinate {coord} is unbounded in the optimization direction")]
    Unbounded {
        /// Index of the unbounded range coordinate
        coord: usize,
    },

    /// The domain region does not live in the relation's domain space.
    #[error("space mismatch: {0}")]
    SpaceMismatch(String),
}
