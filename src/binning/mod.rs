//! Mapping continuous values to discrete bins.
//!
//! Every axis is a `BinTable` of half-open intervals; a value outside the table
//! is "not covered" (`None`) and simply contributes nothing along that axis.

pub mod axes;
pub mod table;

pub use axes::*;
pub use table::*;
