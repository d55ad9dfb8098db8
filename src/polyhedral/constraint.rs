//! Linear constraints over the variables of a space.
//!
//! A constraint is a linear inequality or equality:
//! - Inequality: expr >= 0
//! - Equality: expr = 0

use crate::polyhedral::expr::{floor_div, AffineExpr};
use serde::{Serialize, Deserialize};
use std::fmt;

/// A linear constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    /// The affine expression (constraint is: expr >= 0 or expr = 0)
    pub expr: AffineExpr,
    /// Kind of constraint
    pub kind: ConstraintKind,
}

/// Kind of constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintKind {
    /// Greater than or equal: expr >= 0
    Inequality,
    /// Equal: expr = 0
    Equality,
}

impl Constraint {
    /// Create a new constraint.
    pub fn new(expr: AffineExpr, kind: ConstraintKind) -> Self {
        Self { expr, kind }
    }

    /// Create an inequality constraint: expr >= 0
    pub fn ge_zero(expr: AffineExpr) -> Self {
        Self::new(expr, ConstraintKind::Inequality)
    }

    /// Create an equality constraint: expr = 0
    pub fn eq_zero(expr: AffineExpr) -> Self {
        Self::new(expr, ConstraintKind::Equality)
    }

    /// Create a constraint: lhs >= rhs
    pub fn ge(lhs: AffineExpr, rhs: AffineExpr) -> Self {
        Self::ge_zero(lhs - rhs)
    }

    /// Create a constraint: lhs <= rhs
    pub fn le(lhs: AffineExpr, rhs: AffineExpr) -> Self {
        Self::ge_zero(rhs - lhs)
    }

    /// Create a constraint: lhs = rhs
    pub fn eq(lhs: AffineExpr, rhs: AffineExpr) -> Self {
        Self::eq_zero(lhs - rhs)
    }

    /// Check if this is an equality constraint.
    pub fn is_equality(&self) -> bool {
        matches!(self.kind, ConstraintKind::Equality)
    }

    /// Check if this constraint is satisfied at the given point.
    pub fn is_satisfied(&self, vars: &[i64], params: &[i64]) -> bool {
        let value = self.expr.evaluate(vars, params);
        match self.kind {
            ConstraintKind::Inequality => value >= 0,
            ConstraintKind::Equality => value == 0,
        }
    }

    /// A constraint that no integer point satisfies together with this
    /// one, covering exactly the complement. The complement of an
    /// inequality `e >= 0` over the integers is `e <= -1`; an equality
    /// complements into two pieces, `e >= 1` and `e <= -1`.
    pub fn complement(&self) -> Vec<Constraint> {
        match self.kind {
            ConstraintKind::Inequality => {
                let mut neg = self.expr.clone().scale(-1);
                neg.constant -= 1;
                vec![Self::ge_zero(neg)]
            }
            ConstraintKind::Equality => {
                let mut pos = self.expr.clone();
                pos.constant -= 1;
                let mut neg = self.expr.clone().scale(-1);
                neg.constant -= 1;
                vec![Self::ge_zero(pos), Self::ge_zero(neg)]
            }
        }
    }

    /// Divide out the GCD of the variable and parameter coefficients.
    /// For an inequality the constant is rounded down, which is exact
    /// over the integers; an equality whose constant is not divisible
    /// has no integer solutions and is replaced by an unsatisfiable
    /// constant equality.
    pub fn tightened(&self) -> Constraint {
        let g = self.expr.coeff_gcd();
        if g <= 1 {
            return self.clone();
        }
        match self.kind {
            ConstraintKind::Inequality => {
                let mut expr = self.expr.clone();
                expr.coeffs.iter_mut().for_each(|c| *c /= g);
                expr.param_coeffs.iter_mut().for_each(|c| *c /= g);
                expr.constant = floor_div(expr.constant, g);
                Self::ge_zero(expr)
            }
            ConstraintKind::Equality => {
                if self.expr.constant % g != 0 {
                    let unsat =
                        AffineExpr::constant(1, self.expr.n_var(), self.expr.n_param());
                    return Self::eq_zero(unsat);
                }
                let mut expr = self.expr.clone();
                expr.coeffs.iter_mut().for_each(|c| *c /= g);
                expr.param_coeffs.iter_mut().for_each(|c| *c /= g);
                expr.constant /= g;
                Self::eq_zero(expr)
            }
        }
    }

    /// A constant constraint that cannot be satisfied.
    pub fn is_trivially_unsat(&self) -> bool {
        match self.expr.as_constant() {
            Some(v) => match self.kind {
                ConstraintKind::Inequality => v < 0,
                ConstraintKind::Equality => v != 0,
            },
            None => false,
        }
    }

    /// A constant constraint that always holds.
    pub fn is_trivially_sat(&self) -> bool {
        match self.expr.as_constant() {
            Some(v) => match self.kind {
                ConstraintKind::Inequality => v >= 0,
                ConstraintKind::Equality => v == 0,
            },
            None => false,
        }
    }

    /// Replace variable `idx` by `repl` in the underlying expression.
    pub fn substitute(&self, idx: usize, repl: &AffineExpr) -> Constraint {
        Self::new(self.expr.substitute(idx, repl), self.kind)
    }

    /// Pad the variable vector with zeros up to `n_var`.
    pub fn extended(&self, n_var: usize) -> Constraint {
        Self::new(self.expr.extended(n_var), self.kind)
    }

    /// Drop trailing zero-coefficient variables.
    pub fn truncated(&self, n_var: usize) -> Constraint {
        Self::new(self.expr.truncated(n_var), self.kind)
    }

    /// Rewrite the parameter vector (see [`AffineExpr::align_params`]).
    pub fn align_params(&self, map: &[usize], n_param: usize) -> Constraint {
        Self::new(self.expr.align_params(map, n_param), self.kind)
    }

    /// Convert to string with the given names.
    pub fn to_string_with_names(&self, var_names: &[String], param_names: &[String]) -> String {
        let expr_str = self.expr.to_string_with_names(var_names, param_names);
        match self.kind {
            ConstraintKind::Inequality => format!("{} >= 0", expr_str),
            ConstraintKind::Equality => format!("{} = 0", expr_str),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let var_names: Vec<String> =
            (0..self.expr.n_var()).map(|i| format!("v{}", i)).collect();
        let param_names: Vec<String> =
            (0..self.expr.n_param()).map(|i| format!("p{}", i)).collect();
        write!(f, "{}", self.to_string_with_names(&var_names, &param_names))
    }
}

/// A conjunction of constraints over one space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintSystem {
    /// All constraints in the system
    pub constraints: Vec<Constraint>,
    /// Number of tuple variables
    pub n_var: usize,
    /// Number of parameters
    pub n_param: usize,
}

impl ConstraintSystem {
    /// Create an empty constraint system.
    pub fn new(n_var: usize, n_param: usize) -> Self {
        Self {
            constraints: Vec::new(),
            n_var,
            n_param,
        }
    }

    /// Add a constraint, tightened; trivially satisfied constraints are
    /// dropped.
    pub fn add(&mut self, constraint: Constraint) {
        assert_eq!(constraint.expr.n_var(), self.n_var);
        assert_eq!(constraint.expr.n_param(), self.n_param);
        let constraint = constraint.tightened();
        if constraint.is_trivially_sat() {
            return;
        }
        self.constraints.push(constraint);
    }

    /// Add multiple constraints.
    pub fn add_all(&mut self, constraints: impl IntoIterator<Item = Constraint>) {
        for c in constraints {
            self.add(c);
        }
    }

    /// Iterate over the constraints.
    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter()
    }

    /// Get all equality constraints.
    pub fn equalities(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter().filter(|c| c.is_equality())
    }

    /// Check if a point satisfies all constraints.
    pub fn is_satisfied(&self, vars: &[i64], params: &[i64]) -> bool {
        self.constraints.iter().all(|c| c.is_satisfied(vars, params))
    }

    /// Check if the system has no constraints.
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Get the number of constraints.
    pub fn len(&self) -> usize {
        self.constraints.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        // 0 <= v0 <= 10 over one variable
        let lower = Constraint::ge_zero(AffineExpr::var(0, 1, 0));
        let upper = Constraint::le(AffineExpr::var(0, 1, 0), AffineExpr::constant(10, 1, 0));
        assert!(lower.is_satisfied(&[0], &[]));
        assert!(!lower.is_satisfied(&[-1], &[]));
        assert!(upper.is_satisfied(&[10], &[]));
        assert!(!upper.is_satisfied(&[11], &[]));
    }

    #[test]
    fn test_complement_inequality() {
        let c = Constraint::ge_zero(AffineExpr::var(0, 1, 0));
        let comp = c.complement();
        assert_eq!(comp.len(), 1);
        assert!(comp[0].is_satisfied(&[-1], &[]));
        assert!(!comp[0].is_satisfied(&[0], &[]));
    }

    #[test]
    fn test_complement_equality() {
        let mut expr = AffineExpr::var(0, 1, 0);
        expr.constant = -5;
        let c = Constraint::eq_zero(expr);
        let comp = c.complement();
        assert_eq!(comp.len(), 2);
        for v in [-3i64, 4, 5, 6, 12] {
            let on_complement = comp.iter().any(|p| p.is_satisfied(&[v], &[]));
            assert_eq!(on_complement, v != 5);
        }
    }

    #[test]
    fn test_tighten_inequality() {
        // 2*v0 - 1 >= 0 tightens to v0 - 1 >= 0
        let mut expr = AffineExpr::var(0, 1, 0).scale(2);
        expr.constant = -1;
        let t = Constraint::ge_zero(expr).tightened();
        assert!(t.is_satisfied(&[1], &[]));
        assert!(!t.is_satisfied(&[0], &[]));
    }

    #[test]
    fn test_tighten_equality_unsat() {
        // 2*v0 = 1 has no integer solutions
        let mut expr = AffineExpr::var(0, 1, 0).scale(2);
        expr.constant = -1;
        let t = Constraint::eq_zero(expr).tightened();
        assert!(t.is_trivially_unsat());
    }

    #[test]
    fn test_system() {
        let mut sys = ConstraintSystem::new(2, 0);
        sys.add(Constraint::ge_zero(AffineExpr::var(0, 2, 0)));
        sys.add(Constraint::le(
            AffineExpr::var(0, 2, 0),
            AffineExpr::constant(9, 2, 0),
        ));
        assert!(sys.is_satisfied(&[0, 0], &[]));
        assert!(sys.is_satisfied(&[9, 5], &[]));
        assert!(!sys.is_satisfied(&[10, 0], &[]));

        // trivially satisfied constraints are dropped
        sys.add(Constraint::ge_zero(AffineExpr::constant(3, 2, 0)));
        assert_eq!(sys.len(), 2);
    }
}
