//! The result algebra: what shape an optimum takes.
//!
//! The decomposition engine is generic over the output representation.
//! A result type supplies an empty value, a disjoint union, a
//! constructor from per-piece solver output, and a lexicographic
//! reconciliation of two results with overlapping domains. The two
//! instantiations — [`Relation`] and [`PiecewiseAffine`] — satisfy the
//! same invariants and differ only in encoding.

use crate::lexopt::OptDirection;
use crate::polyhedral::{
    AffineExpr, AffinePiece, BasicRegion, BasicRelation, Constraint, MultiAffine,
    PiecewiseAffine, Relation, Space,
};
use crate::utils::errors::{PolyLexError, PolyLexResult};

/// An output representation for lexicographic optima.
pub trait LexOptResult: Sized {
    /// The result defined for no input tuple, over a relation space.
    fn empty_value(space: &Space) -> Self;

    /// Disjoint union of two results over the same space. The engine
    /// only combines results computed over disjoint domain pieces, so no
    /// merging or tie-breaking is involved.
    fn combine(self, other: Self) -> Self;

    /// Build a result from the solver's per-piece output.
    fn from_pieces(space: &Space, pieces: Vec<AffinePiece>) -> Self;

    /// Reconcile two results whose domains may overlap: where both are
    /// defined, keep the lexicographically better image.
    fn resolve(self, other: Self, dir: OptDirection) -> PolyLexResult<Self>;
}

impl LexOptResult for PiecewiseAffine {
    fn empty_value(space: &Space) -> Self {
        PiecewiseAffine::empty(space.clone())
    }

    fn combine(self, other: Self) -> Self {
        self.union_disjoint(other)
    }

    fn from_pieces(space: &Space, pieces: Vec<AffinePiece>) -> Self {
        PiecewiseAffine::from_pieces(space.clone(), pieces)
    }

    fn resolve(self, other: Self, dir: OptDirection) -> PolyLexResult<Self> {
        let space = self.space().clone();
        let merged = resolve_pieces(self.into_pieces(), other.into_pieces(), dir);
        Ok(PiecewiseAffine::from_pieces(space, merged))
    }
}

impl LexOptResult for Relation {
    fn empty_value(space: &Space) -> Self {
        Relation::empty(space.clone())
    }

    fn combine(self, other: Self) -> Self {
        self.union_disjoint(other)
    }

    fn from_pieces(space: &Space, pieces: Vec<AffinePiece>) -> Self {
        let n_var = space.n_var();
        let n_in = space.n_in;
        let n_param = space.n_param;
        let mut rel = Relation::empty(space.clone());
        for piece in pieces {
            let mut br = BasicRelation::universe(space.clone());
            for c in piece.region.constraints.iter() {
                br.add_constraint(c.extended(n_var));
            }
            for (k, e) in piece.value.exprs().iter().enumerate() {
                let expr = e.extended(n_var) - AffineExpr::var(n_in + k, n_var, n_param);
                br.add_constraint(Constraint::eq_zero(expr));
            }
            rel.add_piece(br);
        }
        rel
    }

    /// Relation-valued results built by this engine pin every range
    /// coordinate with a unit-coefficient equality, so the per-piece
    /// image can be recovered and compared; a relation without that
    /// shape cannot be reconciled and reports an internal error.
    fn resolve(self, other: Self, dir: OptDirection) -> PolyLexResult<Self> {
        if other.is_plain_empty() {
            return Ok(self);
        }
        if self.is_plain_empty() {
            return Ok(other);
        }
        let space = self.space().clone();
        let a = extract_pieces(&self)?;
        let b = extract_pieces(&other)?;
        Ok(<Relation as LexOptResult>::from_pieces(
            &space,
            resolve_pieces(a, b, dir),
        ))
    }
}

/// Recover (region, affine image) pieces from a relation union whose
/// pieces pin each range coordinate with a unit-coefficient equality.
fn extract_pieces(rel: &Relation) -> PolyLexResult<Vec<AffinePiece>> {
    let space = rel.space();
    let n_in = space.n_in;
    let n_out = space.n_out;
    let not_affine =
        || PolyLexError::Internal("result piece image is not in explicit affine form".into());

    let mut out = Vec::with_capacity(rel.n_pieces());
    for br in rel.pieces() {
        let mut region = BasicRegion::universe(space.domain());
        let mut exprs: Vec<Option<AffineExpr>> = vec![None; n_out];
        for c in br.constraints.iter() {
            let outs: Vec<usize> =
                (0..n_out).filter(|&k| c.expr.coeff(n_in + k) != 0).collect();
            match outs.as_slice() {
                [] => region.add_constraint(c.truncated(n_in)),
                [k] if c.is_equality() => {
                    let a = c.expr.coeff(n_in + k);
                    if a.abs() != 1 || exprs[*k].is_some() {
                        return Err(not_affine());
                    }
                    let mut f = c.expr.clone();
                    f.set_coeff(n_in + k, 0);
                    exprs[*k] = Some(f.truncated(n_in).scale(-a));
                }
                _ => return Err(not_affine()),
            }
        }
        let exprs: Vec<AffineExpr> = exprs
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(not_affine)?;
        out.push(AffinePiece {
            region,
            value: MultiAffine::new(space.clone(), exprs),
        });
    }
    Ok(out)
}

/// Merge two disjoint piece lists whose domains may overlap each other:
/// outside the overlap both survive unchanged; on the overlap the first
/// differing image coordinate decides the winner, and identical images
/// keep the first list's piece. The output pieces are pairwise disjoint.
pub(crate) fn resolve_pieces(
    a: Vec<AffinePiece>,
    b: Vec<AffinePiece>,
    dir: OptDirection,
) -> Vec<AffinePiece> {
    let sign = dir.sign();
    let mut out = Vec::new();

    fn exclusive(keep: &[AffinePiece], cut: &[AffinePiece], out: &mut Vec<AffinePiece>) {
        for p in keep {
            let mut rem = vec![p.region.clone()];
            for q in cut {
                rem = rem.iter().flat_map(|r| r.subtract(&q.region)).collect();
            }
            for region in rem {
                out.push(AffinePiece { region, value: p.value.clone() });
            }
        }
    }
    exclusive(&a, &b, &mut out);
    exclusive(&b, &a, &mut out);

    for pa in &a {
        for pb in &b {
            let overlap = pa.region.intersect(&pb.region);
            if overlap.is_empty() {
                continue;
            }
            let n = pa.value.len();
            for k in 0..n {
                let mut wins_a = overlap.clone();
                let mut wins_b = overlap.clone();
                for i in 0..k {
                    let eq = Constraint::eq(
                        pa.value.exprs()[i].clone(),
                        pb.value.exprs()[i].clone(),
                    );
                    wins_a.add_constraint(eq.clone());
                    wins_b.add_constraint(eq);
                }
                let mut a_better =
                    (pb.value.exprs()[k].clone() - pa.value.exprs()[k].clone()).scale(sign);
                a_better.constant -= 1;
                wins_a.add_constraint(Constraint::ge_zero(a_better));
                let mut b_better =
                    (pa.value.exprs()[k].clone() - pb.value.exprs()[k].clone()).scale(sign);
                b_better.constant -= 1;
                wins_b.add_constraint(Constraint::ge_zero(b_better));
                out.push(AffinePiece { region: wins_a, value: pa.value.clone() });
                out.push(AffinePiece { region: wins_b, value: pb.value.clone() });
            }
            let mut tie = overlap;
            for i in 0..n {
                tie.add_constraint(Constraint::eq(
                    pa.value.exprs()[i].clone(),
                    pb.value.exprs()[i].clone(),
                ));
            }
            out.push(AffinePiece { region: tie, value: pa.value.clone() });
        }
    }
    out
}
