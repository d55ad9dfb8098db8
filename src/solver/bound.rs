//! Baseline exact solver for unit-coefficient integer relations.
//!
//! The lexicographic optimum is built one range coordinate at a time, in
//! order. For a minimum, a coordinate's optimal value is the largest of
//! its lower bounds; which bound is largest depends on the inputs and
//! parameters, so the solver splits the domain into the sub-regions where
//! each candidate dominates. The winner is substituted into the remaining
//! constraints; constraints that then mention no range variable restrict
//! where an image exists at all and feed the infeasible region.

use crate::lexopt::OptDirection;
use crate::polyhedral::{
    AffineExpr, AffinePiece, BasicRegion, BasicRelation, Constraint, MultiAffine, Region,
};
use crate::solver::{PieceSolution, PieceSolver, SolverError};
use log::trace;
use std::mem;

/// Exact integer solver for relations whose range coordinates are
/// defined by unit-coefficient bounds.
///
/// Handles the common loop-nest fragment: every range coordinate, taken
/// in lexicographic order, must be bounded in the optimization direction
/// by constraints with coefficient ±1 on that coordinate and no
/// dependence on later coordinates. Everything else — bounds from the
/// other side, parametric bounds, equalities with unit coefficient — is
/// unrestricted. Inputs outside the fragment are rejected with
/// [`SolverError::Unsupported`]; rational relations are not handled.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundSolver;

/// One still-open case split: a sub-region of the domain together with
/// the constraints not yet reduced and the values fixed so far.
struct Branch {
    region: BasicRegion,
    constraints: Vec<Constraint>,
    values: Vec<AffineExpr>,
    next: usize,
}

impl PieceSolver for BoundSolver {
    fn solve(
        &self,
        rel: &BasicRelation,
        dom: &BasicRegion,
        dir: OptDirection,
    ) -> Result<PieceSolution, SolverError> {
        if rel.is_rational() {
            return Err(SolverError::Unsupported(
                "rational relations are not handled by this solver".into(),
            ));
        }
        let space = rel.space();
        if dom.space().n_out != space.n_in
            || dom.space().n_param != space.n_param
        {
            return Err(SolverError::SpaceMismatch(format!(
                "domain {} does not fit relation domain of {}",
                dom.space(),
                space
            )));
        }

        let n_in = space.n_in;
        let n_out = space.n_out;
        let n_var = space.n_var();
        let sign = dir.sign();

        let mut pieces: Vec<AffinePiece> = Vec::new();
        let mut infeasible = Region::empty(dom.space().clone());
        let mut stack = vec![Branch {
            region: dom.clone(),
            constraints: rel.constraints.iter().cloned().collect(),
            values: Vec::new(),
            next: 0,
        }];

        while let Some(mut branch) = stack.pop() {
            // Constraints free of range variables say where an image can
            // exist at all: narrow the region and record the remainder
            // as infeasible.
            let (free, rest): (Vec<_>, Vec<_>) = mem::take(&mut branch.constraints)
                .into_iter()
                .partition(|c| (n_in..n_var).all(|v| c.expr.coeff(v) == 0));
            branch.constraints = rest;
            for check in free {
                let check = check.truncated(n_in);
                for comp in check.complement() {
                    infeasible.add_piece(branch.region.clone().with_constraint(comp));
                }
                branch.region.add_constraint(check);
            }
            if branch.region.is_empty() {
                continue;
            }

            if branch.next == n_out {
                trace!("solved piece: {}", branch.region);
                let value = MultiAffine::new(space.clone(), branch.values);
                pieces.push(AffinePiece { region: branch.region, value });
                continue;
            }

            let out = n_in + branch.next;
            let coord = branch.next;

            // Classify the constraints touching this coordinate. A unit
            // equality pins the coordinate outright, and substitution
            // then handles any other constraint shape exactly, so
            // out-of-fragment shapes only matter when we actually have
            // to branch on competing bounds.
            let mut forced: Option<AffineExpr> = None;
            let mut has_equality = false;
            let mut blocked: Option<SolverError> = None;
            let mut candidates: Vec<AffineExpr> = Vec::new();
            for c in &branch.constraints {
                let a = c.expr.coeff(out);
                if a == 0 {
                    continue;
                }
                let later = (out + 1..n_var).any(|v| c.expr.coeff(v) != 0);
                if c.is_equality() {
                    if later {
                        blocked = Some(SolverError::Unsupported(
                            "equality links several range coordinates".into(),
                        ));
                        continue;
                    }
                    has_equality = true;
                    if a.abs() == 1 && forced.is_none() {
                        let mut f = c.expr.clone();
                        f.set_coeff(out, 0);
                        forced = Some(f.truncated(n_in).scale(-a));
                    }
                } else if a * sign > 0 {
                    // a bound on the side the optimum comes from
                    if later {
                        blocked = Some(SolverError::Unsupported(
                            "range coordinate bounded through later coordinates".into(),
                        ));
                        continue;
                    }
                    if a.abs() != 1 {
                        blocked = Some(SolverError::Unsupported(
                            "non-unit coefficient on a defining bound".into(),
                        ));
                        continue;
                    }
                    let mut f = c.expr.clone();
                    f.set_coeff(out, 0);
                    candidates.push(f.truncated(n_in).scale(-sign));
                }
            }

            if let Some(value) = forced {
                stack.push(fix_coordinate(&branch, out, value, sign, false, n_var));
                continue;
            }
            if let Some(err) = blocked {
                return Err(err);
            }
            if has_equality {
                return Err(SolverError::Unsupported(
                    "equality with non-unit coefficient on a range coordinate".into(),
                ));
            }
            if candidates.is_empty() {
                return Err(SolverError::Unbounded { coord });
            }

            // Split the region by which candidate bound dominates; ties
            // go to the earliest candidate, keeping the sub-regions
            // disjoint.
            for (i, cand) in candidates.iter().enumerate() {
                let mut sub = branch.region.clone();
                for (k, other) in candidates.iter().enumerate() {
                    if k == i {
                        continue;
                    }
                    let mut diff = (cand.clone() - other.clone()).scale(sign);
                    if k < i {
                        diff.constant -= 1;
                    }
                    sub.add_constraint(Constraint::ge_zero(diff));
                }
                if sub.is_empty() {
                    continue;
                }
                let narrowed = Branch { region: sub, ..clone_branch(&branch) };
                stack.push(fix_coordinate(&narrowed, out, cand.clone(), sign, true, n_var));
            }
        }

        Ok(PieceSolution { pieces, infeasible })
    }
}

fn clone_branch(branch: &Branch) -> Branch {
    Branch {
        region: branch.region.clone(),
        constraints: branch.constraints.clone(),
        values: branch.values.clone(),
        next: branch.next,
    }
}

/// Substitute `value` for the range variable `out` throughout a branch,
/// advancing it to the next coordinate. Bounds on the defining side are
/// dropped when `skip_defining` is set: the dominance constraints already
/// imply them for the chosen candidate.
fn fix_coordinate(
    branch: &Branch,
    out: usize,
    value: AffineExpr,
    sign: i64,
    skip_defining: bool,
    n_var: usize,
) -> Branch {
    let lifted = value.extended(n_var);
    let mut constraints = Vec::with_capacity(branch.constraints.len());
    for c in &branch.constraints {
        let a = c.expr.coeff(out);
        if a == 0 {
            constraints.push(c.clone());
            continue;
        }
        if skip_defining && !c.is_equality() && a * sign > 0 {
            continue;
        }
        let sub = c.substitute(out, &lifted).tightened();
        if !sub.is_trivially_sat() {
            constraints.push(sub);
        }
    }
    let mut values = branch.values.clone();
    values.push(value);
    Branch {
        region: branch.region.clone(),
        constraints,
        values,
        next: branch.next + 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polyhedral::Space;

    fn var(idx: usize, n_var: usize) -> AffineExpr {
        AffineExpr::var(idx, n_var, 0)
    }

    fn constant(v: i64, n_var: usize) -> AffineExpr {
        AffineExpr::constant(v, n_var, 0)
    }

    /// { [x] -> [y] : 0 <= y <= 10 }
    fn band() -> BasicRelation {
        BasicRelation::universe(Space::relation(1, 1))
            .with_constraint(Constraint::ge_zero(var(1, 2)))
            .with_constraint(Constraint::le(var(1, 2), constant(10, 2)))
    }

    fn universe_dom() -> BasicRegion {
        BasicRegion::universe(Space::set(1))
    }

    #[test]
    fn test_constant_min() {
        let sol = BoundSolver
            .solve(&band(), &universe_dom(), OptDirection::Min)
            .expect("solve");
        assert_eq!(sol.pieces.len(), 1);
        assert_eq!(sol.pieces[0].value.apply(&[7], &[]), vec![0]);
        assert!(sol.infeasible.is_plain_empty());
    }

    #[test]
    fn test_constant_max() {
        let sol = BoundSolver
            .solve(&band(), &universe_dom(), OptDirection::Max)
            .expect("solve");
        assert_eq!(sol.pieces.len(), 1);
        assert_eq!(sol.pieces[0].value.apply(&[7], &[]), vec![10]);
    }

    #[test]
    fn test_piecewise_dominance() {
        // { [x] -> [y] : y >= x and y >= 0 and y <= 100 }: lexmin is max(x, 0)
        let rel = BasicRelation::universe(Space::relation(1, 1))
            .with_constraint(Constraint::ge(var(1, 2), var(0, 2)))
            .with_constraint(Constraint::ge_zero(var(1, 2)))
            .with_constraint(Constraint::le(var(1, 2), constant(100, 2)));
        let sol = BoundSolver
            .solve(&rel, &universe_dom(), OptDirection::Min)
            .expect("solve");
        assert_eq!(sol.pieces.len(), 2);
        for x in -4..5 {
            let hits: Vec<_> = sol
                .pieces
                .iter()
                .filter(|p| p.region.contains(&[x], &[]))
                .collect();
            assert_eq!(hits.len(), 1, "x = {}", x);
            assert_eq!(hits[0].value.apply(&[x], &[]), vec![x.max(0)]);
        }
    }

    #[test]
    fn test_infeasible_remainder() {
        // { [x] -> [y] : 0 <= y <= 10 and x <= 10 } over 0 <= x <= 20
        let rel = band().with_constraint(Constraint::le(var(0, 2), constant(10, 2)));
        let dom = universe_dom()
            .with_constraint(Constraint::ge_zero(var(0, 1)))
            .with_constraint(Constraint::le(var(0, 1), constant(20, 1)));
        let sol = BoundSolver
            .solve(&rel, &dom, OptDirection::Min)
            .expect("solve");
        for x in 0..=20i64 {
            let solved = sol.pieces.iter().any(|p| p.region.contains(&[x], &[]));
            let lost = sol.infeasible.contains(&[x], &[]);
            assert_eq!(solved, x <= 10, "x = {}", x);
            assert_eq!(lost, x > 10, "x = {}", x);
            assert!(solved != lost);
        }
    }

    #[test]
    fn test_equality_forces_value() {
        // { [x] -> [y] : y = x + 2 }
        let mut shifted = var(0, 2);
        shifted.constant = 2;
        let rel = BasicRelation::universe(Space::relation(1, 1))
            .with_constraint(Constraint::eq(var(1, 2), shifted));
        let sol = BoundSolver
            .solve(&rel, &universe_dom(), OptDirection::Min)
            .expect("solve");
        assert_eq!(sol.pieces.len(), 1);
        assert_eq!(sol.pieces[0].value.apply(&[5], &[]), vec![7]);
        assert!(sol.infeasible.is_plain_empty());
    }

    #[test]
    fn test_unbounded() {
        // { [x] -> [y] : y <= 10 } has no lexicographic minimum
        let rel = BasicRelation::universe(Space::relation(1, 1))
            .with_constraint(Constraint::le(var(1, 2), constant(10, 2)));
        let err = BoundSolver
            .solve(&rel, &universe_dom(), OptDirection::Min)
            .unwrap_err();
        assert_eq!(err, SolverError::Unbounded { coord: 0 });
    }

    #[test]
    fn test_rational_rejected() {
        let rel = band().set_rational(true);
        let err = BoundSolver
            .solve(&rel, &universe_dom(), OptDirection::Min)
            .unwrap_err();
        assert!(matches!(err, SolverError::Unsupported(_)));
    }

    #[test]
    fn test_two_coordinates() {
        // { [x] -> [y, z] : y >= x and z >= y + 1 and z <= 50 }: lexmin (x, x+1)
        let rel = BasicRelation::universe(Space::relation(1, 2))
            .with_constraint(Constraint::ge(var(1, 3), var(0, 3)))
            .with_constraint(Constraint::ge(var(2, 3), {
                let mut e = var(1, 3);
                e.constant = 1;
                e
            }))
            .with_constraint(Constraint::le(var(2, 3), constant(50, 3)));
        let sol = BoundSolver
            .solve(&rel, &universe_dom(), OptDirection::Min)
            .expect("solve");
        for x in 0..4 {
            let hits: Vec<_> = sol
                .pieces
                .iter()
                .filter(|p| p.region.contains(&[x], &[]))
                .collect();
            assert_eq!(hits.len(), 1, "x = {}", x);
            assert_eq!(hits[0].value.apply(&[x], &[]), vec![x, x + 1]);
        }
        // z <= 50 with z = x + 1 caps the feasible inputs at x = 49
        assert!(sol.infeasible.contains(&[50], &[]));
        assert!(!sol.infeasible.contains(&[49], &[]));
    }
}
