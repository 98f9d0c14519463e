//! Trigger-path resolution.
//!
//! - pattern capability (`pattern`)
//! - run -> mandatory path mapping and the resolver (`resolver`)

pub mod pattern;
pub mod resolver;

pub use pattern::*;
pub use resolver::*;
