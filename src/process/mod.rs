//! Event selection and the main loop.
//!
//! - `physics`: kinematic helpers (delta phi, MPF, guarded ratios)
//! - `jec`: optional external jet-energy correction
//! - `counters`: skip reasons and run counters
//! - `range`: batch partitioning of the event index
//! - `processor`: the gate chain and the event loop

pub mod counters;
pub mod jec;
pub mod physics;
pub mod processor;
pub mod range;

pub use counters::*;
pub use jec::*;
pub use physics::*;
pub use processor::*;
pub use range::*;
