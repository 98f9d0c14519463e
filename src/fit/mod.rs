//! End-of-run fits on the accumulated profiles.

pub mod extrapolation;

pub use extrapolation::*;
