//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - jet configuration enums (`JetType`, `JetAlgo`, `JetConfig`)
//! - per-stream input records and the assembled `Event`
//! - the run configuration (`AnalysisConfig`)

pub mod types;

pub use types::*;
