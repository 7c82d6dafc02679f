//! Quaternion helpers for attitude representation
//!
//! Roll-pitch-yaw conventions used throughout the crate:
//! - roll about x, pitch about y, yaw about z
//! - composition R = Rz(yaw) · Ry(pitch) · Rx(roll)
//!
//! The RPY reconstruction is not unique at gimbal lock (pitch = ±90°).

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

/// Build a unit quaternion from roll-pitch-yaw angles [rad]
pub fn rpy_to_quaternion(rpy: &Vector3<f64>) -> UnitQuaternion<f64> {
    UnitQuaternion::from_euler_angles(rpy.x, rpy.y, rpy.z)
}

/// Recover roll-pitch-yaw angles [rad] from a unit quaternion
pub fn quaternion_to_rpy(q: &UnitQuaternion<f64>) -> Vector3<f64> {
    let (roll, pitch, yaw) = q.euler_angles();
    Vector3::new(roll, pitch, yaw)
}

/// Yaw-only rotation that cancels the heading of `q`
///
/// q_corr = Rz(-yaw(q))
pub fn yaw_correction(q: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
    let (_, _, yaw) = q.euler_angles();
    UnitQuaternion::from_euler_angles(0.0, 0.0, -yaw)
}

/// Remove the heading component from an orientation
///
/// q_deyawed = Rz(-yaw) ⊗ q = Ry(pitch) · Rx(roll)
///
/// The result carries the same roll and pitch as `q` and zero yaw, and is
/// returned in the w ≥ 0 hemisphere so `q` and `-q` give the same value.
pub fn remove_yaw(q: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
    canonical(&(yaw_correction(q) * q))
}

/// Representative of `q` with a non-negative scalar part
pub fn canonical(q: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
    if q.w < 0.0 {
        UnitQuaternion::new_unchecked(-q.into_inner())
    } else {
        *q
    }
}

/// Elementwise product of two quaternions' (w, x, y, z) components
pub fn quaternion_component_mul(a: &Quaternion<f64>, b: &Quaternion<f64>) -> Quaternion<f64> {
    Quaternion::from(a.coords.component_mul(&b.coords))
}

/// Quaternion components in (w, x, y, z) order
pub fn quaternion_wxyz(q: &Quaternion<f64>) -> [f64; 4] {
    [q.w, q.i, q.j, q.k]
}
