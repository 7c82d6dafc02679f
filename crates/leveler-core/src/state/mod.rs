//! Chassis state
//!
//! Holds the latest sensor snapshot and turns it into the de-yawed
//! orientation and articulation pose used by the control laws.

mod snapshot;
mod aggregator;

pub use snapshot::*;
pub use aggregator::*;
