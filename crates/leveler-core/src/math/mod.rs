//! Mathematical utilities for the leveling controller
//!
//! Implements roll-pitch-yaw conversions, de-yawing, and the dual
//! quaternion algebra used for pose errors.

pub mod quaternion;
pub mod dual_quaternion;

pub use quaternion::*;
pub use dual_quaternion::*;
