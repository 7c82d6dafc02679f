//! Secondary flipper-joint objective
//!
//! In the orientation-with-null-space mode each flipper is pulled toward a
//! target joint angle:
//!
//! μᵢ = kᵢ · (θᵢ,target − θᵢ)
//!
//! The bias is projected onto the orientation task's null space before it
//! is added to the command, so it never disturbs the roll/pitch objective.

use nalgebra::Vector4;
use serde::{Deserialize, Serialize};

use crate::NUM_UNITS;

/// Target flipper angles and per-unit gains
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NullSpaceGoal {
    /// Target joint angle per unit [rad]
    pub joint_targets: [f64; NUM_UNITS],
    /// Gain per unit
    pub gains: [f64; NUM_UNITS],
}

impl NullSpaceGoal {
    pub fn new(joint_targets: [f64; NUM_UNITS], gains: [f64; NUM_UNITS]) -> Self {
        Self { joint_targets, gains }
    }

    /// Unprojected bias μ for the given flipper angles
    pub fn bias(&self, flipper_angles: &[f64; NUM_UNITS]) -> Vector4<f64> {
        Vector4::from_fn(|i, _| self.gains[i] * (self.joint_targets[i] - flipper_angles[i]))
    }
}

impl Default for NullSpaceGoal {
    /// All flippers at 110° with gain 0.3
    fn default() -> Self {
        Self {
            joint_targets: [110.0_f64.to_radians(); NUM_UNITS],
            gains: [0.3; NUM_UNITS],
        }
    }
}
