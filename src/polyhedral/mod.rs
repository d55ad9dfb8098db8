//! Polyhedral data model.
//!
//! This module provides the value types the optimizer works over:
//! - Tuple spaces with symbolic parameters
//! - Affine expressions and constraints
//! - Convex regions and relations, and unions of them
//! - Piecewise affine maps (closed-form optima)

pub mod space;
pub mod expr;
pub mod constraint;
pub mod region;
pub mod relation;
pub mod piecewise;

pub use space::Space;
pub use expr::AffineExpr;
pub use constraint::{Constraint, ConstraintKind, ConstraintSystem};
pub use region::{BasicRegion, Region};
pub use relation::{BasicRelation, Relation};
pub use piecewise::{AffinePiece, MultiAffine, PiecewiseAffine};
