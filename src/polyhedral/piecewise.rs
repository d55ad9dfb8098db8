//! Piecewise affine values: closed-form optima.
//!
//! A [`MultiAffine`] maps the input tuple of a relation space to its
//! output tuple through one affine expression per output dimension. A
//! [`PiecewiseAffine`] pairs such tuples with disjoint convex regions of
//! the input space, giving a closed-form piecewise map.

use crate::polyhedral::expr::AffineExpr;
use crate::polyhedral::region::{BasicRegion, Region};
use crate::polyhedral::space::Space;
use serde::{Serialize, Deserialize};
use std::fmt;

/// A tuple of affine expressions over (parameters, inputs): one
/// expression per output dimension of a relation space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiAffine {
    space: Space,
    exprs: Vec<AffineExpr>,
}

impl MultiAffine {
    /// Create from per-output expressions over the space's input tuple.
    pub fn new(space: Space, exprs: Vec<AffineExpr>) -> Self {
        assert_eq!(exprs.len(), space.n_out);
        for e in &exprs {
            assert_eq!(e.n_var(), space.n_in);
            assert_eq!(e.n_param(), space.n_param);
        }
        Self { space, exprs }
    }

    /// The relation space this tuple maps within.
    pub fn space(&self) -> &Space {
        &self.space
    }

    /// The per-output expressions.
    pub fn exprs(&self) -> &[AffineExpr] {
        &self.exprs
    }

    /// Number of output expressions.
    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    /// Whether the tuple has no output expressions.
    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    /// Apply the tuple to an input point.
    pub fn apply(&self, input: &[i64], params: &[i64]) -> Vec<i64> {
        self.exprs.iter().map(|e| e.evaluate(input, params)).collect()
    }
}

impl fmt::Display for MultiAffine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let in_names = self.space.all_in_names();
        let param_names = self.space.all_param_names();
        write!(f, "[")?;
        for (i, e) in self.exprs.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", e.to_string_with_names(&in_names, &param_names))?;
        }
        write!(f, "]")
    }
}

/// One piece of a piecewise affine value: where `region` holds, the
/// output is `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffinePiece {
    /// The sub-region of the input space this piece covers
    pub region: BasicRegion,
    /// The affine output tuple on that sub-region
    pub value: MultiAffine,
}

/// A piecewise affine map: a disjoint union of (region, affine tuple)
/// pairs over one relation space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PiecewiseAffine {
    space: Space,
    pieces: Vec<AffinePiece>,
}

impl PiecewiseAffine {
    /// The piecewise value defined nowhere.
    pub fn empty(space: Space) -> Self {
        Self { space, pieces: Vec::new() }
    }

    /// Build from pieces; pieces with a known-empty region are dropped.
    pub fn from_pieces(space: Space, pieces: Vec<AffinePiece>) -> Self {
        let mut out = Self::empty(space);
        for p in pieces {
            out.add_piece(p);
        }
        out
    }

    /// The relation space of the value.
    pub fn space(&self) -> &Space {
        &self.space
    }

    /// The pieces.
    pub fn pieces(&self) -> &[AffinePiece] {
        &self.pieces
    }

    /// Consume into the pieces.
    pub fn into_pieces(self) -> Vec<AffinePiece> {
        self.pieces
    }

    /// Number of pieces.
    pub fn n_pieces(&self) -> usize {
        self.pieces.len()
    }

    /// Add a piece; pieces with a known-empty region are dropped.
    pub fn add_piece(&mut self, piece: AffinePiece) {
        assert_eq!(piece.value.len(), self.space.n_out);
        if !piece.region.is_empty() {
            self.pieces.push(piece);
        }
    }

    /// Whether the value is defined nowhere.
    pub fn is_plain_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// The union of the piece regions: where the map is defined.
    pub fn domain(&self) -> Region {
        Region::from_pieces(
            self.space.domain(),
            self.pieces.iter().map(|p| p.region.clone()).collect(),
        )
    }

    /// Evaluate at an input point, if some piece covers it.
    pub fn evaluate(&self, input: &[i64], params: &[i64]) -> Option<Vec<i64>> {
        self.pieces
            .iter()
            .find(|p| p.region.contains(input, params))
            .map(|p| p.value.apply(input, params))
    }

    /// Union with another piecewise value whose domain is disjoint from
    /// this one's.
    pub fn union_disjoint(mut self, other: PiecewiseAffine) -> PiecewiseAffine {
        assert_eq!(self.space.n_var(), other.space.n_var());
        assert_eq!(self.space.n_param, other.space.n_param);
        self.pieces.extend(other.pieces);
        self
    }
}

impl fmt::Display for PiecewiseAffine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pieces.is_empty() {
            return write!(f, "{{ }}");
        }
        for (i, p) in self.pieces.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{} on {}", p.value, p.region)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polyhedral::constraint::Constraint;

    #[test]
    fn test_apply() {
        // [x] -> [x + 1, 2x]
        let space = Space::relation(1, 2);
        let mut inc = AffineExpr::var(0, 1, 0);
        inc.constant = 1;
        let twice = AffineExpr::var(0, 1, 0).scale(2);
        let ma = MultiAffine::new(space, vec![inc, twice]);
        assert_eq!(ma.apply(&[4], &[]), vec![5, 8]);
    }

    #[test]
    fn test_piecewise_evaluate() {
        // x >= 0 |-> [x]; x <= -1 |-> [0]
        let space = Space::relation(1, 1);
        let dom_space = space.domain();
        let pos = BasicRegion::universe(dom_space.clone())
            .with_constraint(Constraint::ge_zero(AffineExpr::var(0, 1, 0)));
        let neg = BasicRegion::universe(dom_space)
            .with_constraint(Constraint::le(
                AffineExpr::var(0, 1, 0),
                AffineExpr::constant(-1, 1, 0),
            ));
        let pwa = PiecewiseAffine::from_pieces(
            space.clone(),
            vec![
                AffinePiece {
                    region: pos,
                    value: MultiAffine::new(space.clone(), vec![AffineExpr::var(0, 1, 0)]),
                },
                AffinePiece {
                    region: neg,
                    value: MultiAffine::new(space.clone(), vec![AffineExpr::zero(1, 0)]),
                },
            ],
        );
        assert_eq!(pwa.evaluate(&[3], &[]), Some(vec![3]));
        assert_eq!(pwa.evaluate(&[-2], &[]), Some(vec![0]));
        assert_eq!(pwa.n_pieces(), 2);
        assert!(pwa.domain().contains(&[-2], &[]));
    }
}
