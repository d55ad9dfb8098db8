//! The union-decomposition engine and its public entry points.
//!
//! A relation union is folded piece by piece; each convex piece is
//! computed over the full domain and merged into the accumulated result
//! by lexicographic reconciliation. A single convex piece over a union
//! domain is first reduced to pairwise-disjoint convex pieces, each piece
//! is dispatched to the per-piece solver, and the answers are folded
//! with disjoint unions. Every input tuple of the domain ends up either
//! in the result's domain or in the infeasible region, never in both.

use crate::lexopt::result::LexOptResult;
use crate::lexopt::OptDirection;
use crate::polyhedral::{BasicRegion, BasicRelation, PiecewiseAffine, Region, Relation};
use crate::solver::{BoundSolver, PieceSolver};
use crate::utils::errors::{PolyLexError, PolyLexResult};
use log::debug;

/// Compute the lexicographic optimum of a single convex relation over a
/// possibly overlapping union domain, through the given solver.
///
/// Returns the optimum and the sub-region of `dom` with no image tuple.
/// The domain is first partitioned into pairwise-disjoint convex pieces;
/// a syntactically empty partition short-circuits without consulting the
/// solver. Both arguments are consumed.
pub fn basic_partial_lexopt<T: LexOptResult>(
    rel: BasicRelation,
    dom: Region,
    dir: OptDirection,
    solver: &dyn PieceSolver,
) -> PolyLexResult<(T, Region)> {
    if dom.space().n_out != rel.space().n_in || !rel.space().params_match(dom.space()) {
        return Err(PolyLexError::SpaceMismatch(format!(
            "domain {} does not fit relation domain of {}",
            dom.space(),
            rel.space()
        )));
    }

    let dom = dom.make_disjoint();
    if dom.is_plain_empty() {
        // no domain to optimize over; everything is infeasible
        return Ok((T::empty_value(rel.space()), dom));
    }

    debug!(
        "dispatching {} disjoint domain pieces against one convex relation",
        dom.n_pieces()
    );
    let mut res = T::empty_value(rel.space());
    let mut all_empty = Region::empty(dom.space().clone());
    for piece in dom.pieces() {
        let sol = solver.solve(&rel, piece, dir)?;
        res = res.combine(T::from_pieces(rel.space(), sol.pieces));
        all_empty = all_empty.union_disjoint(sol.infeasible);
    }
    Ok((res, all_empty))
}

/// Compute the lexicographic optimum of a relation union over a union
/// domain, through the given solver.
///
/// Parameter tuples are aligned first: matching tuples proceed directly,
/// named mismatches are merged and both sides rewritten, and mismatched
/// unnamed tuples are rejected — they carry no identity to align by.
pub fn partial_lexopt<T: LexOptResult>(
    rel: Relation,
    dom: Region,
    dir: OptDirection,
    solver: &dyn PieceSolver,
) -> PolyLexResult<(T, Region)> {
    if rel.space().params_match(dom.space()) {
        return partial_lexopt_aligned(rel, dom, dir, solver);
    }
    if !rel.space().has_named_params() || !dom.space().has_named_params() {
        return Err(PolyLexError::UnalignedParams);
    }
    let merged = dom.space().merged_param_names(rel.space());
    debug!("aligning parameter tuples to [{}]", merged.join(", "));
    let rel = rel.align_params(&merged)?;
    let dom = dom.align_params(&merged)?;
    partial_lexopt_aligned(rel, dom, dir, solver)
}

/// The aligned union-level fold: each convex relation piece is computed
/// over the full domain; results are merged by lexicographic
/// reconciliation and infeasible regions are intersected, since an input
/// is infeasible only when no piece has an image for it.
fn partial_lexopt_aligned<T: LexOptResult>(
    rel: Relation,
    dom: Region,
    dir: OptDirection,
    solver: &dyn PieceSolver,
) -> PolyLexResult<(T, Region)> {
    if dom.space().n_out != rel.space().n_in {
        return Err(PolyLexError::SpaceMismatch(format!(
            "domain {} does not fit relation domain of {}",
            dom.space(),
            rel.space()
        )));
    }
    if rel.is_plain_empty() {
        return Ok((T::empty_value(rel.space()), dom));
    }

    let mut res = T::empty_value(rel.space());
    let mut todo = dom.clone();
    for piece in rel.into_pieces() {
        let (res_i, todo_i) = basic_partial_lexopt::<T>(piece, dom.clone(), dir, solver)?;
        res = res.resolve(res_i, dir)?;
        todo = todo.intersect(&todo_i);
    }
    Ok((res, todo))
}

impl BasicRelation {
    /// The lexicographic optimum over the relation's intrinsic domain.
    pub fn lexopt(self, dir: OptDirection) -> PolyLexResult<Relation> {
        let dom = Region::universe(self.space().domain());
        Ok(basic_partial_lexopt::<Relation>(self, dom, dir, &BoundSolver)?.0)
    }

    /// The lexicographically smallest image for every domain tuple.
    pub fn lexmin(self) -> PolyLexResult<Relation> {
        self.lexopt(OptDirection::Min)
    }

    /// The lexicographically largest image for every domain tuple.
    pub fn lexmax(self) -> PolyLexResult<Relation> {
        self.lexopt(OptDirection::Max)
    }

    /// Like [`BasicRelation::lexopt`], as a piecewise affine map.
    pub fn lexopt_piecewise(self, dir: OptDirection) -> PolyLexResult<PiecewiseAffine> {
        let dom = Region::universe(self.space().domain());
        Ok(basic_partial_lexopt::<PiecewiseAffine>(self, dom, dir, &BoundSolver)?.0)
    }

    /// Like [`BasicRelation::lexmin`], as a piecewise affine map.
    pub fn lexmin_piecewise(self) -> PolyLexResult<PiecewiseAffine> {
        self.lexopt_piecewise(OptDirection::Min)
    }

    /// Like [`BasicRelation::lexmax`], as a piecewise affine map.
    pub fn lexmax_piecewise(self) -> PolyLexResult<PiecewiseAffine> {
        self.lexopt_piecewise(OptDirection::Max)
    }

    /// The optimum restricted to a caller-supplied domain, plus the
    /// sub-region of the domain with no image. Domain points without an
    /// image are data, not an error.
    pub fn partial_lexopt(
        self,
        dom: Region,
        dir: OptDirection,
    ) -> PolyLexResult<(Relation, Region)> {
        basic_partial_lexopt(self, dom, dir, &BoundSolver)
    }

    /// Minimizing form of [`BasicRelation::partial_lexopt`].
    pub fn partial_lexmin(self, dom: Region) -> PolyLexResult<(Relation, Region)> {
        self.partial_lexopt(dom, OptDirection::Min)
    }

    /// Maximizing form of [`BasicRelation::partial_lexopt`].
    pub fn partial_lexmax(self, dom: Region) -> PolyLexResult<(Relation, Region)> {
        self.partial_lexopt(dom, OptDirection::Max)
    }

    /// Like [`BasicRelation::partial_lexopt`], as a piecewise affine map.
    pub fn partial_lexopt_piecewise(
        self,
        dom: Region,
        dir: OptDirection,
    ) -> PolyLexResult<(PiecewiseAffine, Region)> {
        basic_partial_lexopt(self, dom, dir, &BoundSolver)
    }

    /// Minimizing form of [`BasicRelation::partial_lexopt_piecewise`].
    pub fn partial_lexmin_piecewise(
        self,
        dom: Region,
    ) -> PolyLexResult<(PiecewiseAffine, Region)> {
        self.partial_lexopt_piecewise(dom, OptDirection::Min)
    }

    /// Maximizing form of [`BasicRelation::partial_lexopt_piecewise`].
    pub fn partial_lexmax_piecewise(
        self,
        dom: Region,
    ) -> PolyLexResult<(PiecewiseAffine, Region)> {
        self.partial_lexopt_piecewise(dom, OptDirection::Max)
    }
}

impl Relation {
    /// The lexicographic optimum over the union's intrinsic domain.
    pub fn lexopt(self, dir: OptDirection) -> PolyLexResult<Relation> {
        let dom = Region::universe(self.space().domain());
        Ok(partial_lexopt::<Relation>(self, dom, dir, &BoundSolver)?.0)
    }

    /// The lexicographically smallest image for every domain tuple.
    pub fn lexmin(self) -> PolyLexResult<Relation> {
        self.lexopt(OptDirection::Min)
    }

    /// The lexicographically largest image for every domain tuple.
    pub fn lexmax(self) -> PolyLexResult<Relation> {
        self.lexopt(OptDirection::Max)
    }

    /// Like [`Relation::lexopt`], as a piecewise affine map.
    pub fn lexopt_piecewise(self, dir: OptDirection) -> PolyLexResult<PiecewiseAffine> {
        let dom = Region::universe(self.space().domain());
        Ok(partial_lexopt::<PiecewiseAffine>(self, dom, dir, &BoundSolver)?.0)
    }

    /// Like [`Relation::lexmin`], as a piecewise affine map.
    pub fn lexmin_piecewise(self) -> PolyLexResult<PiecewiseAffine> {
        self.lexopt_piecewise(OptDirection::Min)
    }

    /// Like [`Relation::lexmax`], as a piecewise affine map.
    pub fn lexmax_piecewise(self) -> PolyLexResult<PiecewiseAffine> {
        self.lexopt_piecewise(OptDirection::Max)
    }

    /// The optimum restricted to a caller-supplied domain union, plus
    /// the sub-region of the domain with no image. Parameter tuples are
    /// aligned first (see [`partial_lexopt`]).
    pub fn partial_lexopt(
        self,
        dom: Region,
        dir: OptDirection,
    ) -> PolyLexResult<(Relation, Region)> {
        partial_lexopt(self, dom, dir, &BoundSolver)
    }

    /// Minimizing form of [`Relation::partial_lexopt`].
    pub fn partial_lexmin(self, dom: Region) -> PolyLexResult<(Relation, Region)> {
        self.partial_lexopt(dom, OptDirection::Min)
    }

    /// Maximizing form of [`Relation::partial_lexopt`].
    pub fn partial_lexmax(self, dom: Region) -> PolyLexResult<(Relation, Region)> {
        self.partial_lexopt(dom, OptDirection::Max)
    }

    /// Like [`Relation::partial_lexopt`], as a piecewise affine map.
    pub fn partial_lexopt_piecewise(
        self,
        dom: Region,
        dir: OptDirection,
    ) -> PolyLexResult<(PiecewiseAffine, Region)> {
        partial_lexopt(self, dom, dir, &BoundSolver)
    }

    /// Minimizing form of [`Relation::partial_lexopt_piecewise`].
    pub fn partial_lexmin_piecewise(
        self,
        dom: Region,
    ) -> PolyLexResult<(PiecewiseAffine, Region)> {
        self.partial_lexopt_piecewise(dom, OptDirection::Min)
    }

    /// Maximizing form of [`Relation::partial_lexopt_piecewise`].
    pub fn partial_lexmax_piecewise(
        self,
        dom: Region,
    ) -> PolyLexResult<(PiecewiseAffine, Region)> {
        self.partial_lexopt_piecewise(dom, OptDirection::Max)
    }
}

impl BasicRegion {
    /// The lexicographically extreme point of the region, per parameter
    /// valuation. The region is handled as a relation with a zero-arity
    /// input tuple.
    pub fn lexopt(self, dir: OptDirection) -> PolyLexResult<Region> {
        Ok(BasicRelation::from_region(self).lexopt(dir)?.into_set())
    }

    /// The lexicographically smallest point of the region.
    pub fn lexmin(self) -> PolyLexResult<Region> {
        self.lexopt(OptDirection::Min)
    }

    /// The lexicographically largest point of the region.
    pub fn lexmax(self) -> PolyLexResult<Region> {
        self.lexopt(OptDirection::Max)
    }

    /// Like [`BasicRegion::lexopt`], as a piecewise affine map over a
    /// zero-arity input tuple.
    pub fn lexopt_piecewise(self, dir: OptDirection) -> PolyLexResult<PiecewiseAffine> {
        BasicRelation::from_region(self).lexopt_piecewise(dir)
    }

    /// Like [`BasicRegion::lexmin`], as a piecewise affine map.
    pub fn lexmin_piecewise(self) -> PolyLexResult<PiecewiseAffine> {
        self.lexopt_piecewise(OptDirection::Min)
    }

    /// Like [`BasicRegion::lexmax`], as a piecewise affine map.
    pub fn lexmax_piecewise(self) -> PolyLexResult<PiecewiseAffine> {
        self.lexopt_piecewise(OptDirection::Max)
    }

    /// The extreme point restricted to a parameter-domain region (a
    /// region with no set dimensions), plus the parameter valuations for
    /// which this region is empty.
    pub fn partial_lexopt(
        self,
        dom: Region,
        dir: OptDirection,
    ) -> PolyLexResult<(Region, Region)> {
        let (res, empty) = basic_partial_lexopt::<Relation>(
            BasicRelation::from_region(self),
            dom,
            dir,
            &BoundSolver,
        )?;
        Ok((res.into_set(), empty))
    }

    /// Minimizing form of [`BasicRegion::partial_lexopt`].
    pub fn partial_lexmin(self, dom: Region) -> PolyLexResult<(Region, Region)> {
        self.partial_lexopt(dom, OptDirection::Min)
    }

    /// Maximizing form of [`BasicRegion::partial_lexopt`].
    pub fn partial_lexmax(self, dom: Region) -> PolyLexResult<(Region, Region)> {
        self.partial_lexopt(dom, OptDirection::Max)
    }
}

impl Region {
    /// The lexicographically extreme point of the union, per parameter
    /// valuation.
    pub fn lexopt(self, dir: OptDirection) -> PolyLexResult<Region> {
        Ok(Relation::from_set(self).lexopt(dir)?.into_set())
    }

    /// The lexicographically smallest point of the union.
    pub fn lexmin(self) -> PolyLexResult<Region> {
        self.lexopt(OptDirection::Min)
    }

    /// The lexicographically largest point of the union.
    pub fn lexmax(self) -> PolyLexResult<Region> {
        self.lexopt(OptDirection::Max)
    }

    /// Like [`Region::lexopt`], as a piecewise affine map over a
    /// zero-arity input tuple.
    pub fn lexopt_piecewise(self, dir: OptDirection) -> PolyLexResult<PiecewiseAffine> {
        Relation::from_set(self).lexopt_piecewise(dir)
    }

    /// Like [`Region::lexmin`], as a piecewise affine map.
    pub fn lexmin_piecewise(self) -> PolyLexResult<PiecewiseAffine> {
        self.lexopt_piecewise(OptDirection::Min)
    }

    /// Like [`Region::lexmax`], as a piecewise affine map.
    pub fn lexmax_piecewise(self) -> PolyLexResult<PiecewiseAffine> {
        self.lexopt_piecewise(OptDirection::Max)
    }
}
