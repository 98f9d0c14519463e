//! Pileup reweighting of simulated events.
//!
//! - pileup profiles and their file-based source (`profile`)
//! - reweighter construction and the per-trigger cache (`cache`)

pub mod cache;
pub mod profile;

pub use cache::*;
pub use profile::*;
