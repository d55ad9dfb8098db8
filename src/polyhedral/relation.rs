//! Convex relations and relation unions.
//!
//! A [`BasicRelation`] maps domain tuples to range tuples through one
//! conjunction of affine constraints over (parameters, inputs, outputs);
//! a [`Relation`] is a finite union of convex relations over one shared
//! space. Relations are values: consuming operations take ownership and
//! callers who need an argument afterwards copy it first.

use crate::polyhedral::constraint::{Constraint, ConstraintSystem};
use crate::polyhedral::region::{BasicRegion, Region};
use crate::polyhedral::space::Space;
use crate::utils::errors::{PolyLexError, PolyLexResult};
use serde::{Serialize, Deserialize};
use std::fmt;

/// A convex relation: one conjunction of constraints over a relation
/// space, optionally marked rational.
///
/// An integer relation holds the integer points satisfying its
/// constraints; a rational relation holds all rational points. The flag
/// selects which exact optimum a solver computes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicRelation {
    /// The relation's space
    pub space: Space,
    /// The defining constraints, over inputs then outputs
    pub constraints: ConstraintSystem,
    rational: bool,
}

impl BasicRelation {
    /// The unconstrained relation over `space`.
    pub fn universe(space: Space) -> Self {
        let constraints = ConstraintSystem::new(space.n_var(), space.n_param);
        Self { space, constraints, rational: false }
    }

    /// View a region as a relation with a zero-arity input tuple, so the
    /// region's dimensions become the range tuple.
    pub fn from_region(region: BasicRegion) -> Self {
        debug_assert!(region.space.is_set());
        Self {
            space: region.space,
            constraints: region.constraints,
            rational: false,
        }
    }

    /// The relation's space.
    pub fn space(&self) -> &Space {
        &self.space
    }

    /// Mark the relation as rational or integer.
    pub fn set_rational(mut self, rational: bool) -> Self {
        self.rational = rational;
        self
    }

    /// Whether the relation is solved over the rationals.
    pub fn is_rational(&self) -> bool {
        self.rational
    }

    /// Add a constraint.
    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.add(constraint);
    }

    /// Builder form of [`BasicRelation::add_constraint`].
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.add_constraint(constraint);
        self
    }

    /// Check whether the relation contains the pair (input, output).
    pub fn contains(&self, input: &[i64], output: &[i64], params: &[i64]) -> bool {
        let mut vars = Vec::with_capacity(self.space.n_var());
        vars.extend_from_slice(input);
        vars.extend_from_slice(output);
        self.constraints.is_satisfied(&vars, params)
    }

    /// Syntactic emptiness: some single constraint is unsatisfiable on
    /// its own.
    pub fn is_obviously_empty(&self) -> bool {
        self.constraints.iter().any(|c| c.is_trivially_unsat())
    }

    /// Emptiness by elimination (see [`BasicRegion::is_empty`]).
    pub fn is_empty(&self) -> bool {
        self.as_region_internal().is_empty()
    }

    /// View the constraints as a region over a flattened set space.
    fn as_region_internal(&self) -> BasicRegion {
        let space = Space::set_with_params(self.space.n_var(), self.space.n_param)
            .with_param_names(self.space.param_names.clone());
        BasicRegion { space, constraints: self.constraints.clone() }
    }

    /// Convert a relation with a zero-arity input tuple back to a region.
    pub(crate) fn into_region(self) -> BasicRegion {
        debug_assert_eq!(self.space.n_in, 0);
        BasicRegion { space: self.space, constraints: self.constraints }
    }

    /// Rewrite into the parameter tuple given by `target`.
    pub fn align_params(&self, target: &[String]) -> PolyLexResult<BasicRelation> {
        let map = self.space.param_map(target).ok_or_else(|| {
            PolyLexError::SpaceMismatch("cannot align parameters by name".into())
        })?;
        let space = self.space.align_params(target);
        let mut constraints = ConstraintSystem::new(space.n_var(), space.n_param);
        constraints.add_all(
            self.constraints
                .iter()
                .map(|c| c.align_params(&map, target.len())),
        );
        Ok(BasicRelation { space, constraints, rational: self.rational })
    }
}

impl fmt::Display for BasicRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let in_names = self.space.all_in_names();
        let out_names = self.space.all_out_names();
        let var_names = self.space.all_var_names();
        let param_names = self.space.all_param_names();
        write!(f, "{{ [{}] -> [{}]", in_names.join(", "), out_names.join(", "))?;
        if !self.constraints.is_empty() {
            write!(f, " : ")?;
            for (i, c) in self.constraints.iter().enumerate() {
                if i > 0 {
                    write!(f, " and ")?;
                }
                write!(f, "{}", c.to_string_with_names(&var_names, &param_names))?;
            }
        }
        write!(f, " }}")
    }
}

/// A union of convex relations over one shared space.
///
/// Semantically a set union of the pieces' point sets. Known-empty
/// pieces are dropped on construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relation {
    space: Space,
    pieces: Vec<BasicRelation>,
}

impl Relation {
    /// The empty union over `space`.
    pub fn empty(space: Space) -> Self {
        Self { space, pieces: Vec::new() }
    }

    /// Build a union from convex pieces over `space`.
    pub fn from_pieces(space: Space, pieces: Vec<BasicRelation>) -> Self {
        let mut rel = Self::empty(space);
        for p in pieces {
            rel.add_piece(p);
        }
        rel
    }

    /// View a region union as a relation union with a zero-arity input
    /// tuple.
    pub fn from_set(region: Region) -> Self {
        let space = region.space().clone();
        let pieces = region
            .into_pieces()
            .into_iter()
            .map(BasicRelation::from_region)
            .collect();
        // pieces are already known nonempty
        Self { space, pieces }
    }

    /// The union's space.
    pub fn space(&self) -> &Space {
        &self.space
    }

    /// The convex pieces.
    pub fn pieces(&self) -> &[BasicRelation] {
        &self.pieces
    }

    /// Consume the union into its convex pieces.
    pub fn into_pieces(self) -> Vec<BasicRelation> {
        self.pieces
    }

    /// Number of convex pieces.
    pub fn n_pieces(&self) -> usize {
        self.pieces.len()
    }

    /// Add a convex piece; known-empty pieces are dropped.
    pub fn add_piece(&mut self, piece: BasicRelation) {
        assert_eq!(piece.space.n_var(), self.space.n_var());
        assert_eq!(piece.space.n_param, self.space.n_param);
        if !piece.is_empty() {
            self.pieces.push(piece);
        }
    }

    /// Syntactic emptiness: the union has no pieces.
    pub fn is_plain_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Check whether any piece contains the pair (input, output).
    pub fn contains(&self, input: &[i64], output: &[i64], params: &[i64]) -> bool {
        self.pieces.iter().any(|p| p.contains(input, output, params))
    }

    /// Union with another relation whose point set is disjoint from this
    /// one's.
    pub fn union_disjoint(mut self, other: Relation) -> Relation {
        assert_eq!(self.space.n_var(), other.space.n_var());
        assert_eq!(self.space.n_param, other.space.n_param);
        self.pieces.extend(other.pieces);
        self
    }

    /// Convert a relation union with a zero-arity input tuple back to a
    /// region union.
    pub(crate) fn into_set(self) -> Region {
        let space = self.space.clone();
        Region::from_pieces(
            space,
            self.pieces.into_iter().map(BasicRelation::into_region).collect(),
        )
    }

    /// Rewrite into the parameter tuple given by `target`.
    pub fn align_params(&self, target: &[String]) -> PolyLexResult<Relation> {
        let space = self.space.align_params(target);
        let mut out = Relation::empty(space);
        for p in &self.pieces {
            out.add_piece(p.align_params(target)?);
        }
        Ok(out)
    }
}

impl From<BasicRelation> for Relation {
    fn from(piece: BasicRelation) -> Self {
        let space = piece.space.clone();
        Relation::from_pieces(space, vec![piece])
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pieces.is_empty() {
            return write!(f, "{{ }}");
        }
        for (i, p) in self.pieces.iter().enumerate() {
            if i > 0 {
                write!(f, " u ")?;
            }
            write!(f, "{}", p)?;
        }
        Ok(())
    }
}
