//! Numerical utilities: weighted least squares.

pub mod ols;

pub use ols::*;
