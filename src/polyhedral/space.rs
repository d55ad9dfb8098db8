//! Tuple spaces for polyhedral relations and regions.
//!
//! A space describes the shape of a relation or region:
//! - Parameter dimensions (symbolic constants)
//! - Input dimensions (the domain tuple of a relation)
//! - Output dimensions (the range tuple of a relation, or the
//!   dimensions of a region)

use serde::{Serialize, Deserialize};
use std::fmt;

/// The shape of a relation or region: arities plus optional names.
///
/// A region is a space with no input dimensions; its points live in the
/// output tuple. Parameter names are optional — a space with `n_param > 0`
/// and no names has *unnamed* parameters, which carry no identity and
/// cannot be aligned against another space (see [`Space::params_match`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    /// Number of parameter dimensions
    pub n_param: usize,
    /// Number of input dimensions (zero for regions)
    pub n_in: usize,
    /// Number of output dimensions
    pub n_out: usize,
    /// Names of parameters (empty = unnamed)
    pub param_names: Vec<String>,
    /// Names of input dimensions (optional)
    pub in_names: Vec<String>,
    /// Names of output dimensions (optional)
    pub out_names: Vec<String>,
}

impl Space {
    /// Create a region space with the given number of dimensions.
    pub fn set(n_out: usize) -> Self {
        Self {
            n_param: 0,
            n_in: 0,
            n_out,
            param_names: Vec::new(),
            in_names: Vec::new(),
            out_names: Vec::new(),
        }
    }

    /// Create a region space with parameters.
    pub fn set_with_params(n_out: usize, n_param: usize) -> Self {
        Self { n_param, ..Self::set(n_out) }
    }

    /// Create a relation space.
    pub fn relation(n_in: usize, n_out: usize) -> Self {
        Self { n_in, ..Self::set(n_out) }
    }

    /// Create a relation space with parameters.
    pub fn relation_with_params(n_in: usize, n_out: usize, n_param: usize) -> Self {
        Self { n_param, n_in, ..Self::set(n_out) }
    }

    /// Check if this is a region space (no input dimensions).
    pub fn is_set(&self) -> bool {
        self.n_in == 0
    }

    /// Number of tuple variables (inputs then outputs) of constraints
    /// over this space.
    pub fn n_var(&self) -> usize {
        self.n_in + self.n_out
    }

    /// Set parameter names.
    pub fn with_param_names(mut self, names: Vec<String>) -> Self {
        assert!(names.is_empty() || names.len() == self.n_param);
        self.param_names = names;
        self
    }

    /// Set input dimension names.
    pub fn with_in_names(mut self, names: Vec<String>) -> Self {
        assert!(names.is_empty() || names.len() == self.n_in);
        self.in_names = names;
        self
    }

    /// Set output dimension names.
    pub fn with_out_names(mut self, names: Vec<String>) -> Self {
        assert!(names.is_empty() || names.len() == self.n_out);
        self.out_names = names;
        self
    }

    /// The domain of a relation space, as a region space.
    pub fn domain(&self) -> Space {
        Space::set_with_params(self.n_in, self.n_param)
            .with_param_names(self.param_names.clone())
            .with_out_names(self.in_names.clone())
    }

    /// The range of a relation space, as a region space.
    pub fn range(&self) -> Space {
        Space::set_with_params(self.n_out, self.n_param)
            .with_param_names(self.param_names.clone())
            .with_out_names(self.out_names.clone())
    }

    /// Whether the parameters of this space carry names.
    ///
    /// A space without parameters trivially has named parameters.
    pub fn has_named_params(&self) -> bool {
        self.n_param == 0 || self.param_names.len() == self.n_param
    }

    /// Check whether the parameter tuples of two spaces match: the same
    /// named parameters in the same order, or both fully unnamed with
    /// equal arity.
    pub fn params_match(&self, other: &Space) -> bool {
        if self.n_param != other.n_param {
            return false;
        }
        self.param_names == other.param_names
    }

    /// Merge the named parameters of two spaces: this space's parameters
    /// first, then the other's extras in order.
    pub fn merged_param_names(&self, other: &Space) -> Vec<String> {
        let mut merged = self.param_names.clone();
        for name in &other.param_names {
            if !merged.contains(name) {
                merged.push(name.clone());
            }
        }
        merged
    }

    /// For each of this space's parameters, its position in `target`.
    /// Returns `None` when a parameter is unnamed or missing from `target`.
    pub fn param_map(&self, target: &[String]) -> Option<Vec<usize>> {
        if !self.has_named_params() {
            return None;
        }
        self.param_names
            .iter()
            .map(|name| target.iter().position(|t| t == name))
            .collect()
    }

    /// Rewrite this space into the parameter tuple given by `target`.
    pub fn align_params(&self, target: &[String]) -> Space {
        let mut space = self.clone();
        space.n_param = target.len();
        space.param_names = target.to_vec();
        space
    }

    /// All output/region dimension names, with defaults.
    pub fn all_out_names(&self) -> Vec<String> {
        (0..self.n_out)
            .map(|i| {
                self.out_names
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| format!("o{}", i))
            })
            .collect()
    }

    /// All input dimension names, with defaults.
    pub fn all_in_names(&self) -> Vec<String> {
        (0..self.n_in)
            .map(|i| {
                self.in_names
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| format!("i{}", i))
            })
            .collect()
    }

    /// All parameter names, with defaults.
    pub fn all_param_names(&self) -> Vec<String> {
        (0..self.n_param)
            .map(|i| {
                self.param_names
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| format!("p{}", i))
            })
            .collect()
    }

    /// Names of all tuple variables, inputs then outputs.
    pub fn all_var_names(&self) -> Vec<String> {
        let mut names = self.all_in_names();
        names.extend(self.all_out_names());
        names
    }
}

impl fmt::Display for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_set() {
            write!(f, "[{}]", self.n_out)?;
        } else {
            write!(f, "[{}] -> [{}]", self.n_in, self.n_out)?;
        }
        if self.n_param > 0 {
            write!(f, " : {} params", self.n_param)?;
        }
        Ok(())
    }
}
