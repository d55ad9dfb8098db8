//! Convex regions and region unions.
//!
//! A [`BasicRegion`] is a single conjunction of affine constraints over a
//! set space; a [`Region`] is a finite union of convex pieces over one
//! shared space. Regions serve both as domain restrictions for
//! lexicographic optimization and as its infeasible-region output.

use crate::polyhedral::constraint::{Constraint, ConstraintKind, ConstraintSystem};
use crate::polyhedral::space::Space;
use crate::utils::errors::{PolyLexError, PolyLexResult};
use log::debug;
use serde::{Serialize, Deserialize};
use std::fmt;

/// Cap on the number of constraints produced while eliminating variables
/// in the emptiness test; past this the test conservatively reports
/// "not known empty".
const ELIMINATION_LIMIT: usize = 2048;

/// A convex region: one conjunction of constraints over a set space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicRegion {
    /// The region's space
    pub space: Space,
    /// The defining constraints
    pub constraints: ConstraintSystem,
}

impl BasicRegion {
    /// The unconstrained region over `space`.
    pub fn universe(space: Space) -> Self {
        let constraints = ConstraintSystem::new(space.n_var(), space.n_param);
        Self { space, constraints }
    }

    /// The region's space.
    pub fn space(&self) -> &Space {
        &self.space
    }

    /// Add a constraint.
    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.add(constraint);
    }

    /// Builder form of [`BasicRegion::add_constraint`].
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.add_constraint(constraint);
        self
    }

    /// Check if the region contains the given point.
    pub fn contains(&self, point: &[i64], params: &[i64]) -> bool {
        self.constraints.is_satisfied(point, params)
    }

    /// Syntactic emptiness: some single constraint is unsatisfiable on
    /// its own.
    pub fn is_obviously_empty(&self) -> bool {
        self.constraints.iter().any(|c| c.is_trivially_unsat())
    }

    /// Emptiness by elimination: projects out every variable and
    /// parameter and checks the resulting constant constraints. Exact
    /// over the rationals; combined with the integer tightening applied
    /// on every added constraint this catches the integer-empty regions
    /// arising here. Conservative (may report a false "not empty") but
    /// never drops a nonempty region.
    pub fn is_empty(&self) -> bool {
        if self.is_obviously_empty() {
            return true;
        }
        if self.constraints.is_empty() {
            return false;
        }
        eliminate_all(&self.constraints)
    }

    /// Intersect with another region over the same space.
    pub fn intersect(&self, other: &BasicRegion) -> BasicRegion {
        assert_eq!(self.space.n_var(), other.space.n_var());
        assert_eq!(self.space.n_param, other.space.n_param);
        let mut result = self.clone();
        result.constraints.add_all(other.constraints.iter().cloned());
        result
    }

    /// Subtract another convex region, returning the difference as a list
    /// of disjoint convex pieces: the i-th piece satisfies the first i
    /// constraints of `other` and violates the (i+1)-th.
    pub fn subtract(&self, other: &BasicRegion) -> Vec<BasicRegion> {
        let mut pieces = Vec::new();
        let mut carved = self.clone();
        for c in other.constraints.iter() {
            for comp in c.complement() {
                let piece = carved.clone().with_constraint(comp);
                if !piece.is_empty() {
                    pieces.push(piece);
                }
            }
            carved = carved.with_constraint(c.clone());
        }
        pieces
    }

    /// Rewrite into the parameter tuple given by `target`.
    pub fn align_params(&self, target: &[String]) -> PolyLexResult<BasicRegion> {
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
        Ok(BasicRegion { space, constraints })
    }
}

impl fmt::Display for BasicRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let var_names = self.space.all_out_names();
        let param_names = self.space.all_param_names();
        write!(f, "{{ [{}]", var_names.join(", "))?;
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

/// Rational-relaxation emptiness of a conjunction: Fourier–Motzkin
/// elimination of every variable and parameter, then a check of the
/// surviving constant constraints.
fn eliminate_all(system: &ConstraintSystem) -> bool {
    // equalities as inequality pairs
    let mut rows: Vec<Constraint> = Vec::with_capacity(system.len() * 2);
    for c in system.iter() {
        match c.kind {
            ConstraintKind::Inequality => rows.push(c.clone()),
            ConstraintKind::Equality => {
                rows.push(Constraint::ge_zero(c.expr.clone()));
                rows.push(Constraint::ge_zero(c.expr.clone().scale(-1)));
            }
        }
    }

    let n_var = system.n_var;
    let n_param = system.n_param;
    for pos in 0..n_var + n_param {
        let coeff_at = |c: &Constraint| {
            if pos < n_var {
                c.expr.coeff(pos)
            } else {
                c.expr.param_coeff(pos - n_var)
            }
        };
        let (involved, rest): (Vec<_>, Vec<_>) = rows.into_iter().partition(|c| coeff_at(c) != 0);
        rows = rest;
        let lowers: Vec<&Constraint> = involved.iter().filter(|&c| coeff_at(c) > 0).collect();
        let uppers: Vec<&Constraint> = involved.iter().filter(|&c| coeff_at(c) < 0).collect();
        for &low in &lowers {
            for &up in &uppers {
                let a = coeff_at(low);
                let b = coeff_at(up);
                // a*up + (-b)*low has a zero coefficient at pos
                let combined = up.expr.clone().scale(a) + low.expr.clone().scale(-b);
                let combined = Constraint::ge_zero(combined).tightened();
                if combined.is_trivially_unsat() {
                    return true;
                }
                if !combined.is_trivially_sat() {
                    rows.push(combined);
                }
            }
        }
        if rows.len() > ELIMINATION_LIMIT {
            return false;
        }
    }
    rows.iter().any(|c| c.is_trivially_unsat())
}

/// A union of convex regions over one shared space.
///
/// Semantically a set union: piece order and count are not observable,
/// only the union's point set. Known-empty pieces are dropped on
/// construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    space: Space,
    pieces: Vec<BasicRegion>,
}

impl Region {
    /// The empty union over `space`.
    pub fn empty(space: Space) -> Self {
        Self { space, pieces: Vec::new() }
    }

    /// The single-piece unconstrained union over `space`.
    pub fn universe(space: Space) -> Self {
        let piece = BasicRegion::universe(space.clone());
        Self { space, pieces: vec![piece] }
    }

    /// Build a union from convex pieces over `space`.
    pub fn from_pieces(space: Space, pieces: Vec<BasicRegion>) -> Self {
        let mut region = Self::empty(space);
        for p in pieces {
            region.add_piece(p);
        }
        region
    }

    /// The union's space.
    pub fn space(&self) -> &Space {
        &self.space
    }

    /// The convex pieces.
    pub fn pieces(&self) -> &[BasicRegion] {
        &self.pieces
    }

    /// Consume the union into its convex pieces.
    pub fn into_pieces(self) -> Vec<BasicRegion> {
        self.pieces
    }

    /// Number of convex pieces.
    pub fn n_pieces(&self) -> usize {
        self.pieces.len()
    }

    /// Add a convex piece; known-empty pieces are dropped.
    pub fn add_piece(&mut self, piece: BasicRegion) {
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

    /// Check if any piece contains the given point.
    pub fn contains(&self, point: &[i64], params: &[i64]) -> bool {
        self.pieces.iter().any(|p| p.contains(point, params))
    }

    /// Union with another region whose point set is disjoint from this
    /// one's.
    pub fn union_disjoint(mut self, other: Region) -> Region {
        assert_eq!(self.space.n_var(), other.space.n_var());
        assert_eq!(self.space.n_param, other.space.n_param);
        self.pieces.extend(other.pieces);
        self
    }

    /// Intersect with another union over the same space.
    pub fn intersect(&self, other: &Region) -> Region {
        let mut out = Region::empty(self.space.clone());
        for a in &self.pieces {
            for b in &other.pieces {
                out.add_piece(a.intersect(b));
            }
        }
        out
    }

    /// Subtract another union from this one.
    pub fn subtract(self, other: &Region) -> Region {
        let mut remaining = self.pieces;
        for b in &other.pieces {
            remaining = remaining.iter().flat_map(|r| r.subtract(b)).collect();
        }
        Region::from_pieces(self.space, remaining)
    }

    /// Rewrite the union into a partition of pairwise-disjoint convex
    /// pieces with the same point set.
    ///
    /// Pieces are folded in order and each new piece is reduced by
    /// subtracting every already-accepted piece, so earlier pieces own
    /// shared boundary points.
    pub fn make_disjoint(self) -> Region {
        if self.pieces.len() <= 1 {
            return self;
        }
        let n_before = self.pieces.len();
        let mut accepted: Vec<BasicRegion> = Vec::new();
        for piece in self.pieces {
            let mut remainder = vec![piece];
            for prior in &accepted {
                remainder = remainder.iter().flat_map(|r| r.subtract(prior)).collect();
            }
            accepted.extend(remainder);
        }
        debug!(
            "make_disjoint: {} overlapping pieces -> {} disjoint pieces",
            n_before,
            accepted.len()
        );
        Region::from_pieces(self.space, accepted)
    }

    /// Rewrite into the parameter tuple given by `target`.
    pub fn align_params(&self, target: &[String]) -> PolyLexResult<Region> {
        let space = self.space.align_params(target);
        let mut out = Region::empty(space);
        for p in &self.pieces {
            out.add_piece(p.align_params(target)?);
        }
        Ok(out)
    }
}

impl From<BasicRegion> for Region {
    fn from(piece: BasicRegion) -> Self {
        let space = piece.space.clone();
        Region::from_pieces(space, vec![piece])
    }
}

impl fmt::Display for Region {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polyhedral::expr::AffineExpr;

    /// 1-D region lo <= x <= hi.
    fn interval(lo: i64, hi: i64) -> BasicRegion {
        let x = || AffineExpr::var(0, 1, 0);
        BasicRegion::universe(Space::set(1))
            .with_constraint(Constraint::ge(x(), AffineExpr::constant(lo, 1, 0)))
            .with_constraint(Constraint::le(x(), AffineExpr::constant(hi, 1, 0)))
    }

    #[test]
    fn test_contains() {
        let r = interval(0, 5);
        assert!(r.contains(&[0], &[]));
        assert!(r.contains(&[5], &[]));
        assert!(!r.contains(&[6], &[]));
    }

    #[test]
    fn test_is_empty_by_elimination() {
        // x <= 5 and x >= 101: no single constraint is unsatisfiable
        let r = interval(101, 5);
        assert!(!r.is_obviously_empty());
        assert!(r.is_empty());
        assert!(!interval(0, 0).is_empty());
    }

    #[test]
    fn test_subtract() {
        let diff_pieces = interval(0, 10).subtract(&interval(3, 5));
        let diff = Region::from_pieces(Space::set(1), diff_pieces);
        for x in -2..13 {
            let expected = (0..=10).contains(&x) && !(3..=5).contains(&x);
            assert_eq!(diff.contains(&[x], &[]), expected, "x = {}", x);
        }
    }

    #[test]
    fn test_subtract_disjoint_pieces() {
        let pieces = interval(0, 10).subtract(&interval(3, 5));
        for x in -2..13 {
            let covering = pieces.iter().filter(|p| p.contains(&[x], &[])).count();
            assert!(covering <= 1, "x = {} covered {} times", x, covering);
        }
    }

    #[test]
    fn test_make_disjoint_overlapping() {
        let union = Region::from_pieces(Space::set(1), vec![interval(0, 5), interval(3, 8)]);
        let disjoint = union.clone().make_disjoint();
        for x in -2..11 {
            assert_eq!(
                disjoint.contains(&[x], &[]),
                union.contains(&[x], &[]),
                "x = {}",
                x
            );
            let covering = disjoint
                .pieces()
                .iter()
                .filter(|p| p.contains(&[x], &[]))
                .count();
            assert!(covering <= 1, "x = {} covered {} times", x, covering);
        }
    }

    #[test]
    fn test_make_disjoint_drops_empty_pieces() {
        let union = Region::from_pieces(Space::set(1), vec![interval(0, 5), interval(1, 4)]);
        let disjoint = union.make_disjoint();
        assert_eq!(disjoint.n_pieces(), 1);
    }

    #[test]
    fn test_union_subtract() {
        let a = Region::from_pieces(Space::set(1), vec![interval(0, 10), interval(20, 25)]);
        let b = Region::from_pieces(Space::set(1), vec![interval(4, 6), interval(22, 30)]);
        let diff = a.subtract(&b);
        for x in -1..32 {
            let expected = (0..=3).contains(&x) || (7..=10).contains(&x) || (20..=21).contains(&x);
            assert_eq!(diff.contains(&[x], &[]), expected, "x = {}", x);
        }
    }

    #[test]
    fn test_intersect_union() {
        let a = Region::from_pieces(Space::set(1), vec![interval(0, 4), interval(8, 12)]);
        let b = Region::from(interval(3, 9));
        let i = a.intersect(&b);
        for x in -1..14 {
            let expected = (3..=4).contains(&x) || (8..=9).contains(&x);
            assert_eq!(i.contains(&[x], &[]), expected, "x = {}", x);
        }
    }
}
