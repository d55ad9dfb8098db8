//! Lexicographic optimization of polyhedral relations.
//!
//! This module is the composition layer: it reduces a possibly
//! overlapping union domain to disjoint convex pieces, dispatches each
//! piece to a [`crate::solver::PieceSolver`], and folds the per-piece
//! answers into a whole-relation result. The fold is written once,
//! generic over the result representation (see [`LexOptResult`]), and
//! instantiated for relation-valued and piecewise-affine-valued optima.
//!
//! Entry points live on the value types: [`BasicRelation::lexmin`],
//! [`Relation::partial_lexmax`], [`Region::lexmin`] and friends.
//!
//! [`BasicRelation::lexmin`]: crate::polyhedral::BasicRelation::lexmin
//! [`Relation::partial_lexmax`]: crate::polyhedral::Relation::partial_lexmax
//! [`Region::lexmin`]: crate::polyhedral::Region::lexmin

pub mod engine;
pub mod result;

pub use engine::{basic_partial_lexopt, partial_lexopt};
pub use result::LexOptResult;

use serde::{Serialize, Deserialize};

/// Whether to compute the lexicographic minimum or maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptDirection {
    /// Lexicographically smallest range tuple
    Min,
    /// Lexicographically largest range tuple
    Max,
}

impl OptDirection {
    /// Orientation of the optimum: +1 when minimizing, -1 when
    /// maximizing. A bound with coefficient `a` on a range coordinate
    /// defines the optimum exactly when `a * sign > 0`.
    pub fn sign(self) -> i64 {
        match self {
            OptDirection::Min => 1,
            OptDirection::Max => -1,
        }
    }
}
