//! Latest sensor measurements
//!
//! Each field arrives independently and starts unset. A field, once set, is
//! only ever replaced by a newer measurement.

use nalgebra::{UnitQuaternion, Vector3};

/// Latest measurement of every input the controller consumes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorSnapshot {
    /// Chassis orientation from the IMU
    pub orientation: Option<UnitQuaternion<f64>>,
    /// Chassis-to-ground distance vector [m] (only z is used)
    pub ground_distance: Option<Vector3<f64>>,
    /// Joint positions [rad]; the last four entries are the flipper joints
    pub joint_positions: Option<Vec<f64>>,
}

impl SensorSnapshot {
    /// Whether every input has been received at least once
    pub fn is_ready(&self) -> bool {
        self.orientation.is_some() && self.ground_distance.is_some() && self.joint_positions.is_some()
    }

    /// Names of the inputs that have never been received
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.orientation.is_none() {
            missing.push("orientation");
        }
        if self.ground_distance.is_none() {
            missing.push("ground_distance");
        }
        if self.joint_positions.is_none() {
            missing.push("joint_positions");
        }
        missing
    }
}
