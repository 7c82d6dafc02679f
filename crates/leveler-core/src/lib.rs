//! # Leveler Core
//!
//! Pose-leveling control for a tracked chassis with four independently
//! actuated flipper units.
//!
//! Given the chassis orientation, the distance to the ground and the flipper
//! joint angles, the controller computes one vertical-velocity command per
//! flipper unit that drives the chassis toward a commanded pose.
//!
//! ## Modules
//!
//! - [`math`]: Quaternion helpers and dual quaternion algebra
//! - [`kinematics`]: Orientation/articulation Jacobians and null-space projector
//! - [`control`]: Setpoint and gains, control modes, control law evaluation
//! - [`state`]: Sensor snapshot and de-yawed chassis state
//! - [`error`]: Error taxonomy

pub mod math;
pub mod kinematics;
pub mod control;
pub mod state;
pub mod error;

pub use error::LevelerError;

/// Number of flipper/propulsion units on the chassis
pub const NUM_UNITS: usize = 4;
