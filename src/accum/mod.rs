//! Streaming accumulation of weighted samples.
//!
//! - `hist`: 1-D and 2-D weighted histograms
//! - `profile`: continuous-alpha response profiles
//! - `monitor`: control distributions
//! - `engine`: the dense, pre-allocated leaf store and its `fill` contract

pub mod engine;
pub mod hist;
pub mod monitor;
pub mod profile;

pub use engine::*;
pub use hist::*;
pub use monitor::*;
pub use profile::*;
