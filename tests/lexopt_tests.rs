//! Integration tests for the lexicographic optimization pipeline.

use anyhow::Result;
use polylex::prelude::*;
use polylex::{parse_region, parse_relation};

/// Count how many convex pieces of the result relation cover the pair
/// (input, output).
fn covering_pieces(rel: &Relation, input: &[i64], output: &[i64]) -> usize {
    rel.pieces()
        .iter()
        .filter(|p| p.contains(input, output, &[]))
        .count()
}

#[test]
fn test_overlapping_union_domain_lexmin() -> Result<()> {
    // R = { (x) -> (y) : 0 <= y <= 10 }, D = [0,5] u [3,8] (overlapping).
    // Every x in [0,8] maps to y = 0; nothing is infeasible.
    let rel = parse_relation("{ [x] -> [y] : 0 <= y and y <= 10 }")?;
    let dom = parse_region("{ [x] : 0 <= x <= 5 or 3 <= x <= 8 }")?;

    let (res, infeasible) = rel.partial_lexmin(dom)?;
    for x in 0..=8 {
        assert!(res.contains(&[x], &[0], &[]), "x = {}", x);
        assert!(!res.contains(&[x], &[1], &[]), "x = {}", x);
    }
    assert!(!res.contains(&[9], &[0], &[]));
    assert!(!res.contains(&[-1], &[0], &[]));
    assert!(infeasible.is_plain_empty());
    Ok(())
}

#[test]
fn test_no_input_tuple_dropped_or_duplicated() -> Result<()> {
    // The atoms of the disjointified domain are pairwise disjoint, so
    // each input tuple must be claimed by exactly one result piece.
    let rel = parse_relation("{ [x] -> [y] : 0 <= y and y <= 10 }")?;
    let dom = parse_region("{ [x] : 0 <= x <= 5 or 3 <= x <= 8 }")?;

    let (res, _) = rel.partial_lexmin(dom)?;
    for x in 0..=8 {
        assert_eq!(covering_pieces(&res, &[x], &[0]), 1, "x = {}", x);
    }
    Ok(())
}

#[test]
fn test_partition_completeness_with_infeasible_part() -> Result<()> {
    // R additionally requires x <= 10; D = [0,20]. The result covers
    // [0,10] and the infeasible region is exactly (10,20].
    let rel = parse_relation("{ [x] -> [y] : 0 <= y and y <= 10 and x <= 10 }")?;
    let dom = parse_region("{ [x] : 0 <= x <= 20 }")?;

    let (res, infeasible) = rel.partial_lexmin(dom)?;
    for x in 0..=20 {
        let solved = res.contains(&[x], &[0], &[]);
        let lost = infeasible.contains(&[x], &[]);
        assert_eq!(solved, x <= 10, "x = {}", x);
        assert_eq!(lost, x > 10, "x = {}", x);
        // exactly one of the two, never both
        assert!(solved != lost, "x = {}", x);
    }
    Ok(())
}

#[test]
fn test_empty_domain_boundary() -> Result<()> {
    let rel = parse_relation("{ [x] -> [y] : 0 <= y and y <= 10 }")?;
    let dom = parse_region("{ [x] : 1 = 0 }")?;

    let (res, infeasible) = rel.partial_lexmin(dom)?;
    assert!(res.is_plain_empty());
    assert!(infeasible.is_plain_empty());
    Ok(())
}

#[test]
fn test_lexopt_totality_matches_partial_over_intrinsic_domain() -> Result<()> {
    // lexmin over the relation's own domain equals the partial result,
    // with nothing infeasible, when the supplied domain is the
    // intrinsic one.
    let source = "{ [x] -> [y] : 0 <= y and y <= 10 and x <= 10 }";
    let total = parse_relation(source)?.lexmin()?;
    let (partial, infeasible) =
        parse_relation(source)?.partial_lexmin(parse_region("{ [x] : x <= 10 }")?)?;

    assert!(infeasible.is_plain_empty());
    for x in -3..=13 {
        for y in -1..=11 {
            assert_eq!(
                total.contains(&[x], &[y], &[]),
                partial.contains(&[x], &[y], &[]),
                "x = {}, y = {}",
                x,
                y
            );
        }
    }
    Ok(())
}

#[test]
fn test_lexmax() -> Result<()> {
    let res = parse_relation("{ [x] -> [y] : 0 <= y and y <= 10 }")?.lexmax()?;
    assert!(res.contains(&[7], &[10], &[]));
    assert!(!res.contains(&[7], &[9], &[]));
    Ok(())
}

#[test]
fn test_piecewise_optimum_splits_domain() -> Result<()> {
    // lexmin of y over y >= x, y >= 0 is max(x, 0): one affine piece
    // per dominating lower bound.
    let rel = parse_relation("{ [x] -> [y] : y >= x and y >= 0 and y <= 100 }")?;
    let pwa = rel.lexmin_piecewise()?;
    assert_eq!(pwa.n_pieces(), 2);
    for x in -5..=5 {
        assert_eq!(pwa.evaluate(&[x], &[]), Some(vec![x.max(0)]), "x = {}", x);
    }
    Ok(())
}

#[test]
fn test_piecewise_lexmax_min_of_upper_bounds() -> Result<()> {
    // lexmax of y over y <= x, y <= 10, y >= 0 is min(x, 10) for x >= 0
    // and undefined below.
    let rel = parse_relation("{ [x] -> [y] : y <= x and y <= 10 and y >= 0 }")?;
    let pwa = rel.lexmax_piecewise()?;
    for x in 0..=20 {
        assert_eq!(pwa.evaluate(&[x], &[]), Some(vec![x.min(10)]), "x = {}", x);
    }
    assert_eq!(pwa.evaluate(&[-3], &[]), None);
    Ok(())
}

#[test]
fn test_relational_and_piecewise_agree() -> Result<()> {
    let source = "{ [x] -> [y] : y >= x and y >= 0 and y <= 100 }";
    let dom = "{ [x] : -4 <= x <= 4 }";
    let (rel_res, rel_empty) =
        parse_relation(source)?.partial_lexmin(parse_region(dom)?)?;
    let (pwa_res, pwa_empty) =
        parse_relation(source)?.partial_lexmin_piecewise(parse_region(dom)?)?;

    assert!(rel_empty.is_plain_empty());
    assert!(pwa_empty.is_plain_empty());
    for x in -4..=4 {
        let y = pwa_res.evaluate(&[x], &[]).expect("defined");
        assert!(rel_res.contains(&[x], &y, &[]), "x = {}", x);
        assert_eq!(y, vec![x.max(0)]);
    }
    Ok(())
}

#[test]
fn test_parametric_bound_and_alignment() -> Result<()> {
    // The relation speaks about N, the domain about M: both sides are
    // rewritten into one parameter tuple (domain's parameters first).
    let rel = parse_relation("[N] -> { [x] -> [y] : 0 <= y and y <= N }")?;
    let dom = parse_region("[M] -> { [x] : 0 <= x <= M }")?;

    let (res, infeasible) = rel.partial_lexmin(dom)?;
    assert_eq!(
        res.space().param_names,
        vec!["M".to_string(), "N".to_string()]
    );

    // with M = 3, N = 5: everything in [0,3] maps to 0
    assert!(res.contains(&[2], &[0], &[3, 5]));
    assert!(!res.contains(&[4], &[0], &[3, 5]));
    // with N = -1 the relation is empty: the whole domain is infeasible
    assert!(!res.contains(&[2], &[0], &[3, -1]));
    assert!(infeasible.contains(&[2], &[3, -1]));
    assert!(!infeasible.contains(&[2], &[3, 5]));
    Ok(())
}

#[test]
fn test_unnamed_parameter_mismatch_is_an_error() {
    let rel = Relation::from(BasicRelation::universe(Space::relation_with_params(1, 1, 1)));
    let dom = Region::universe(Space::set_with_params(1, 2));
    let err = rel.partial_lexmin(dom).unwrap_err();
    assert!(matches!(err, PolyLexError::UnalignedParams));
    assert_eq!(err.to_string(), "unaligned unnamed parameters");
}

#[test]
fn test_set_lexmin_and_lexmax() -> Result<()> {
    let source = "{ [i, j] : 0 <= i <= 4 and 2 <= j <= 9 }";

    let smallest = parse_region(source)?.lexmin()?;
    assert!(smallest.contains(&[0, 2], &[]));
    assert!(!smallest.contains(&[0, 3], &[]));
    assert!(!smallest.contains(&[1, 2], &[]));

    let largest = parse_region(source)?.lexmax()?;
    assert!(largest.contains(&[4, 9], &[]));
    assert!(!largest.contains(&[4, 8], &[]));
    Ok(())
}

#[test]
fn test_set_union_lexmin_competes_across_pieces() -> Result<()> {
    // the smallest point of the union comes from the second piece
    let region = parse_region("{ [i] : 3 <= i <= 8 or 0 <= i <= 5 }")?;
    let smallest = region.lexmin()?;
    assert!(smallest.contains(&[0], &[]));
    assert!(!smallest.contains(&[3], &[]));
    Ok(())
}

#[test]
fn test_relation_union_competes_across_pieces() -> Result<()> {
    // two overlapping relation pieces offer different images; the
    // lexicographically smaller one must win on the overlap
    let rel = parse_relation(
        "{ [x] -> [y] : y = 5 and 0 <= x <= 10 or y = 2 and 5 <= x <= 15 }",
    )?;
    let res = rel.lexmin()?;
    for x in 0..=4 {
        assert!(res.contains(&[x], &[5], &[]), "x = {}", x);
        assert!(!res.contains(&[x], &[2], &[]), "x = {}", x);
    }
    for x in 5..=15 {
        assert!(res.contains(&[x], &[2], &[]), "x = {}", x);
        assert!(!res.contains(&[x], &[5], &[]), "x = {}", x);
    }
    Ok(())
}

#[test]
fn test_unbounded_optimum_is_an_error() -> Result<()> {
    let err = parse_relation("{ [x] -> [y] : y <= 10 }")?.lexmin().unwrap_err();
    assert!(matches!(
        err,
        PolyLexError::Solver(SolverError::Unbounded { coord: 0 })
    ));
    // the same relation has a well-defined maximum
    let res = parse_relation("{ [x] -> [y] : y <= 10 }")?.lexmax()?;
    assert!(res.contains(&[0], &[10], &[]));
    Ok(())
}

#[test]
fn test_rational_relation_rejected_by_baseline_solver() {
    let rel = BasicRelation::universe(Space::relation(1, 1)).set_rational(true);
    let err = rel.lexmin().unwrap_err();
    assert!(matches!(
        err,
        PolyLexError::Solver(SolverError::Unsupported(_))
    ));
}

#[test]
fn test_basic_region_partial_lexmin_over_parameter_domain() -> Result<()> {
    // the smallest point of { [i] : N <= i <= 10 } is N itself; for
    // N > 10 the region is empty and that shows up as infeasibility of
    // the parameter valuation
    let region = parse_region("[N] -> { [i] : N <= i <= 10 }")?;
    let piece = region.into_pieces().remove(0);
    let dom = parse_region("[N] -> { [] : -5 <= N <= 20 }")?;

    let (smallest, empty_params) = piece.partial_lexmin(dom)?;
    assert!(smallest.contains(&[3], &[3]));
    assert!(smallest.contains(&[-5], &[-5]));
    assert!(!smallest.contains(&[2], &[3]));
    assert!(empty_params.contains(&[], &[12]));
    assert!(!empty_params.contains(&[], &[5]));
    Ok(())
}

#[test]
fn test_two_dimensional_lexmin_order() -> Result<()> {
    // lexicographic order fixes coordinates front to back: i settles on
    // its own lower bound, then j on a bound that mentions i
    let rel = parse_relation("{ [x] -> [i, j] : x <= i and i <= 10 and j >= i + 1 and j <= 50 }")?;
    let pwa = rel.lexmin_piecewise()?;
    assert_eq!(pwa.evaluate(&[2], &[]), Some(vec![2, 3]));
    assert_eq!(pwa.evaluate(&[10], &[]), Some(vec![10, 11]));
    // beyond i <= 10 there is no image at all
    assert_eq!(pwa.evaluate(&[12], &[]), None);
    Ok(())
}
