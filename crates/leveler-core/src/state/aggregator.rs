//! Chassis state aggregation
//!
//! Merges the latest orientation, ground distance and joint readings into
//! the state the control laws consume:
//!
//! - de-yawed orientation: q_R = Rz(−yaw) ⊗ q_imu
//! - articulation pose: x_R = (1 + ε·[0, 0, h]/2) ⊗ q_R
//! - sign-corrected flipper joint angles

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::math::{remove_yaw, DualQuaternion};
use crate::NUM_UNITS;

use super::SensorSnapshot;

/// Sign applied to each flipper joint reading
///
/// Right-side flipper encoders (units 1 and 3) count in the opposite
/// direction, so by default their readings are negated to make all four
/// angles grow in the same physical direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointSignConvention(pub [f64; NUM_UNITS]);

impl Default for JointSignConvention {
    fn default() -> Self {
        Self([1.0, -1.0, 1.0, -1.0])
    }
}

impl JointSignConvention {
    /// Extract the sign-corrected flipper angles from a joint array
    ///
    /// The flipper joints are the last four entries. Returns `None` if the
    /// array holds fewer than four entries.
    pub fn flipper_angles(&self, joint_positions: &[f64]) -> Option<[f64; NUM_UNITS]> {
        let start = joint_positions.len().checked_sub(NUM_UNITS)?;
        let flippers = &joint_positions[start..];
        Some(std::array::from_fn(|i| self.0[i] * flippers[i]))
    }
}

/// Chassis state used by the control laws
#[derive(Debug, Clone, PartialEq)]
pub struct ChassisState {
    /// Orientation with the heading removed
    pub orientation: UnitQuaternion<f64>,
    /// Distance from chassis to ground [m]
    pub height: f64,
    /// Articulation pose (de-yawed orientation + height)
    pub pose: DualQuaternion,
    /// Sign-corrected flipper joint angles [rad], if available
    pub flipper_angles: Option<[f64; NUM_UNITS]>,
}

/// Builds [`ChassisState`] from a [`SensorSnapshot`]
#[derive(Debug, Clone, Default)]
pub struct StateAggregator {
    joint_signs: JointSignConvention,
    /// Set while the joint array is too short; the warning is logged once per episode
    short_joints_reported: bool,
}

impl StateAggregator {
    pub fn new(joint_signs: JointSignConvention) -> Self {
        Self {
            joint_signs,
            short_joints_reported: false,
        }
    }

    /// Aggregate the snapshot, or `None` while any input is still unset
    pub fn aggregate(&mut self, snapshot: &SensorSnapshot) -> Option<ChassisState> {
        let raw = snapshot.orientation.as_ref()?;
        let ground = snapshot.ground_distance.as_ref()?;
        let joints = snapshot.joint_positions.as_deref()?;

        Some(self.chassis_state(raw, ground.z, joints))
    }

    /// Chassis state from individual readings
    pub fn chassis_state(
        &mut self,
        raw_orientation: &UnitQuaternion<f64>,
        height: f64,
        joint_positions: &[f64],
    ) -> ChassisState {
        let orientation = remove_yaw(raw_orientation);
        let pose = DualQuaternion::from_translation_rotation(&Vector3::new(0.0, 0.0, height), &orientation);

        let flipper_angles = self.joint_signs.flipper_angles(joint_positions);
        match (flipper_angles.is_some(), self.short_joints_reported) {
            (false, false) => {
                log::warn!(
                    "Joint array has {} entries, expected at least {} flipper joints",
                    joint_positions.len(),
                    NUM_UNITS
                );
                self.short_joints_reported = true;
            }
            (true, true) => {
                log::info!("Flipper joint readings available again");
                self.short_joints_reported = false;
            }
            _ => {}
        }

        ChassisState {
            orientation,
            height,
            pose,
            flipper_angles,
        }
    }
}
