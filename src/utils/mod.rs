//! Utility modules shared across the crate.

pub mod errors;

pub use errors::{PolyLexError, PolyLexResult};
