//! Reporting utilities: end-of-run summary.

pub mod format;

pub use format::*;
