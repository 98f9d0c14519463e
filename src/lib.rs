//! `gammajet-finalizer` library crate.
//!
//! The binary (`gammajet`) is a thin wrapper around this library so that:
//!
//! - the event selection and accumulation are testable without spawning processes
//! - inputs and configuration resources can be exercised from unit tests
//! - code stays easy to navigate as the analysis grows

pub mod accum;
pub mod app;
pub mod binning;
pub mod cancel;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod process;
pub mod report;
pub mod reweight;
pub mod trigger;
