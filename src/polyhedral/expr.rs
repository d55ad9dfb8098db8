//! Affine expressions over the variables of a space.
//!
//! An affine expression is a linear combination of tuple variables and
//! parameters plus a constant:
//! `aff(x) = c0 + c1*x1 + ... + cn*xn + d1*p1 + ... + dk*pk`

use num_integer::Integer;
use serde::{Serialize, Deserialize};
use std::fmt;
use std::ops::{Add, Sub, Neg};

/// Integer floor division (rounds toward negative infinity).
pub(crate) fn floor_div(a: i64, b: i64) -> i64 {
    if b == 0 {
        return 0;
    }
    let d = a / b;
    let r = a % b;
    if (r != 0) && ((r < 0) != (b < 0)) {
        d - 1
    } else {
        d
    }
}

/// An affine expression: constant + sum(coeff[i] * var[i]) + sum(param_coeff[i] * param[i]).
///
/// The tuple variables are the inputs followed by the outputs of the
/// expression's space; a region has only output variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffineExpr {
    /// Constant term
    pub constant: i64,
    /// Coefficients for tuple variables
    pub coeffs: Vec<i64>,
    /// Coefficients for parameters
    pub param_coeffs: Vec<i64>,
}

impl AffineExpr {
    /// Create a zero expression.
    pub fn zero(n_var: usize, n_param: usize) -> Self {
        Self {
            constant: 0,
            coeffs: vec![0; n_var],
            param_coeffs: vec![0; n_param],
        }
    }

    /// Create a constant expression.
    pub fn constant(value: i64, n_var: usize, n_param: usize) -> Self {
        Self { constant: value, ..Self::zero(n_var, n_param) }
    }

    /// Create an expression for a single tuple variable.
    pub fn var(idx: usize, n_var: usize, n_param: usize) -> Self {
        let mut expr = Self::zero(n_var, n_param);
        if idx < n_var {
            expr.coeffs[idx] = 1;
        }
        expr
    }

    /// Create an expression for a parameter.
    pub fn param(idx: usize, n_var: usize, n_param: usize) -> Self {
        let mut expr = Self::zero(n_var, n_param);
        if idx < n_param {
            expr.param_coeffs[idx] = 1;
        }
        expr
    }

    /// Check if this is a constant expression.
    pub fn is_constant(&self) -> bool {
        self.coeffs.iter().all(|&c| c == 0) && self.param_coeffs.iter().all(|&c| c == 0)
    }

    /// Get the constant value if this is a constant expression.
    pub fn as_constant(&self) -> Option<i64> {
        if self.is_constant() {
            Some(self.constant)
        } else {
            None
        }
    }

    /// Number of tuple variables.
    pub fn n_var(&self) -> usize {
        self.coeffs.len()
    }

    /// Number of parameters.
    pub fn n_param(&self) -> usize {
        self.param_coeffs.len()
    }

    /// Coefficient for a tuple variable.
    pub fn coeff(&self, idx: usize) -> i64 {
        self.coeffs.get(idx).copied().unwrap_or(0)
    }

    /// Coefficient for a parameter.
    pub fn param_coeff(&self, idx: usize) -> i64 {
        self.param_coeffs.get(idx).copied().unwrap_or(0)
    }

    /// Set the coefficient for a tuple variable.
    pub fn set_coeff(&mut self, idx: usize, value: i64) {
        if idx < self.coeffs.len() {
            self.coeffs[idx] = value;
        }
    }

    /// Evaluate the expression at concrete variable and parameter values.
    pub fn evaluate(&self, vars: &[i64], params: &[i64]) -> i64 {
        let mut result = self.constant;
        for (i, &c) in self.coeffs.iter().enumerate() {
            if let Some(&v) = vars.get(i) {
                result += c * v;
            }
        }
        for (i, &c) in self.param_coeffs.iter().enumerate() {
            if let Some(&v) = params.get(i) {
                result += c * v;
            }
        }
        result
    }

    /// Scale the expression by a constant factor.
    pub fn scale(&self, factor: i64) -> Self {
        Self {
            constant: self.constant * factor,
            coeffs: self.coeffs.iter().map(|&c| c * factor).collect(),
            param_coeffs: self.param_coeffs.iter().map(|&c| c * factor).collect(),
        }
    }

    /// Replace variable `idx` by `repl`: the result has a zero coefficient
    /// for `idx` and absorbs `coeff(idx) * repl`. `repl` must have the same
    /// variable layout and must not itself use `idx`.
    pub fn substitute(&self, idx: usize, repl: &AffineExpr) -> Self {
        let a = self.coeff(idx);
        if a == 0 {
            return self.clone();
        }
        debug_assert_eq!(repl.coeff(idx), 0);
        let mut out = self.clone();
        out.set_coeff(idx, 0);
        out + repl.scale(a)
    }

    /// GCD of all variable and parameter coefficients (not the constant).
    /// Zero when the expression is constant.
    pub fn coeff_gcd(&self) -> i64 {
        let mut g = 0i64;
        for &c in self.coeffs.iter().chain(self.param_coeffs.iter()) {
            g = g.gcd(&c.abs());
        }
        g
    }

    /// Pad the variable vector with zero coefficients up to `n_var`.
    pub fn extended(&self, n_var: usize) -> Self {
        assert!(n_var >= self.coeffs.len());
        let mut out = self.clone();
        out.coeffs.resize(n_var, 0);
        out
    }

    /// Drop trailing variables, which must have zero coefficients.
    pub fn truncated(&self, n_var: usize) -> Self {
        debug_assert!(self.coeffs[n_var..].iter().all(|&c| c == 0));
        let mut out = self.clone();
        out.coeffs.truncate(n_var);
        out
    }

    /// Rewrite the parameter vector: old parameter `i` moves to position
    /// `map[i]` in a tuple of `n_param` parameters.
    pub fn align_params(&self, map: &[usize], n_param: usize) -> Self {
        let mut param_coeffs = vec![0; n_param];
        for (i, &c) in self.param_coeffs.iter().enumerate() {
            param_coeffs[map[i]] = c;
        }
        Self {
            constant: self.constant,
            coeffs: self.coeffs.clone(),
            param_coeffs,
        }
    }

    /// Convert to string with the given variable and parameter names.
    pub fn to_string_with_names(&self, var_names: &[String], param_names: &[String]) -> String {
        let mut parts = Vec::new();

        if self.constant != 0 || self.is_constant() {
            parts.push(format!("{}", self.constant));
        }

        let mut term = |c: i64, name: &str| {
            if c == 1 {
                parts.push(name.to_string());
            } else if c == -1 {
                parts.push(format!("-{}", name));
            } else if c != 0 {
                parts.push(format!("{}*{}", c, name));
            }
        };

        for (i, &c) in self.coeffs.iter().enumerate() {
            let default_name = format!("v{}", i);
            let name = var_names.get(i).map(|s| s.as_str()).unwrap_or(&default_name);
            term(c, name);
        }
        for (i, &c) in self.param_coeffs.iter().enumerate() {
            let default_name = format!("p{}", i);
            let name = param_names.get(i).map(|s| s.as_str()).unwrap_or(&default_name);
            term(c, name);
        }

        if parts.is_empty() {
            "0".to_string()
        } else {
            parts.join(" + ").replace("+ -", "- ")
        }
    }
}

impl Add for AffineExpr {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        assert_eq!(self.coeffs.len(), other.coeffs.len());
        assert_eq!(self.param_coeffs.len(), other.param_coeffs.len());
        Self {
            constant: self.constant + other.constant,
            coeffs: self.coeffs.iter().zip(&other.coeffs).map(|(&a, &b)| a + b).collect(),
            param_coeffs: self
                .param_coeffs
                .iter()
                .zip(&other.param_coeffs)
                .map(|(&a, &b)| a + b)
                .collect(),
        }
    }
}

impl Sub for AffineExpr {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        self + other.neg()
    }
}

impl Neg for AffineExpr {
    type Output = Self;

    fn neg(self) -> Self {
        self.scale(-1)
    }
}

impl fmt::Display for AffineExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let var_names: Vec<String> = (0..self.n_var()).map(|i| format!("v{}", i)).collect();
        let param_names: Vec<String> = (0..self.n_param()).map(|i| format!("p{}", i)).collect();
        write!(f, "{}", self.to_string_with_names(&var_names, &param_names))
    }
}
