//! Pose setpoint and proportional gains
//!
//! Both records keep the raw values only in algebraic form: the setpoint as
//! an orientation quaternion plus a pose dual quaternion, the gains as an
//! orientation-gain quaternion plus a pose-gain dual quaternion. Both are
//! immutable once built; updates replace the whole record.

use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::math::{rpy_to_quaternion, DualQuaternion};

/// Desired chassis pose
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseSetpoint {
    orientation: UnitQuaternion<f64>,
    pose: DualQuaternion,
}

impl PoseSetpoint {
    /// Build the setpoint from a translation [m] and roll-pitch-yaw [rad]
    ///
    /// The pose dual quaternion uses the translate-then-rotate convention.
    pub fn new(translation: &Vector3<f64>, orientation_rpy: &Vector3<f64>) -> Self {
        let orientation = rpy_to_quaternion(orientation_rpy);
        let pose = DualQuaternion::from_translation_rotation(translation, &orientation);
        Self { orientation, pose }
    }

    /// Desired orientation as a quaternion
    pub fn orientation(&self) -> &UnitQuaternion<f64> {
        &self.orientation
    }

    /// Desired pose as a dual quaternion
    pub fn pose(&self) -> &DualQuaternion {
        &self.pose
    }

    /// Translation recovered from the pose dual quaternion [m]
    pub fn translation(&self) -> Vector3<f64> {
        self.pose.translation()
    }

    /// Roll-pitch-yaw recovered from the stored orientation [rad]
    ///
    /// Not unique at gimbal lock (pitch = ±90°): any roll/yaw pair with the
    /// same difference describes the same rotation there.
    pub fn rpy(&self) -> Vector3<f64> {
        self.pose.rpy()
    }
}

impl Default for PoseSetpoint {
    /// Level chassis 0.3 m above the ground
    fn default() -> Self {
        Self::new(&Vector3::new(0.0, 0.0, 0.3), &Vector3::zeros())
    }
}

/// Per-axis proportional gains
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseGains {
    orientation: Quaternion<f64>,
    pose: DualQuaternion,
}

impl PoseGains {
    /// Build the gains from per-axis orientation and translation gains
    ///
    /// The scalar parts of the quaternion and of both dual quaternion parts
    /// are fixed at 1.
    pub fn new(orientation_gains: &Vector3<f64>, translation_gains: &Vector3<f64>) -> Self {
        let o = orientation_gains;
        let t = translation_gains;
        Self {
            orientation: Quaternion::new(1.0, o.x, o.y, o.z),
            pose: DualQuaternion::from_vec8([1.0, o.x, o.y, o.z, 1.0, t.x, t.y, t.z]),
        }
    }

    /// Orientation gain quaternion (1, kx, ky, kz)
    pub fn orientation(&self) -> &Quaternion<f64> {
        &self.orientation
    }

    /// Pose gain dual quaternion (1, kx, ky, kz) + ε(1, kx', ky', kz')
    pub fn pose(&self) -> &DualQuaternion {
        &self.pose
    }

    /// Orientation gains as read back from the pose gain
    pub fn orientation_gains(&self) -> Vector3<f64> {
        self.pose.primary.imag()
    }

    /// Translation gains as read back from the pose gain
    pub fn translation_gains(&self) -> Vector3<f64> {
        self.pose.dual.imag()
    }
}

impl Default for PoseGains {
    fn default() -> Self {
        Self::new(&Vector3::new(2.0, 4.0, 1.0), &Vector3::new(1.0, 1.0, 0.8))
    }
}
