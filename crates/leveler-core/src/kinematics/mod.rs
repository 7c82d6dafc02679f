//! Kinematics module
//!
//! Builds the orientation and articulation Jacobians of the chassis and the
//! null-space projector of the orientation task from the flipper mounting
//! geometry.

mod model;

pub use model::*;
