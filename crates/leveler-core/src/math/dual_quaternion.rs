//! Dual quaternion algebra for rigid poses
//!
//! A dual quaternion x = P + ε·D stores a rotation in its primary part P and
//! the translation in its dual part D. Poses are composed translate-then-rotate:
//!
//! ```text
//! x = (1 + ε·t/2) ⊗ r    =>    P = r,  D = ½·t ⊗ r
//! ```
//!
//! so the translation is recovered as t = 2·D ⊗ P*.
//!
//! Components are exchanged as 8-vectors ordered
//! (wp, xp, yp, zp, wd, xd, yd, zd).

use std::ops::Mul;

use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use super::quaternion::{quaternion_component_mul, quaternion_to_rpy, quaternion_wxyz};

/// Dual quaternion P + ε·D
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DualQuaternion {
    /// Primary (rotation) part
    pub primary: Quaternion<f64>,
    /// Dual (translation) part
    pub dual: Quaternion<f64>,
}

impl DualQuaternion {
    pub fn new(primary: Quaternion<f64>, dual: Quaternion<f64>) -> Self {
        Self { primary, dual }
    }

    /// Identity pose (no rotation, no translation)
    pub fn identity() -> Self {
        Self::new(Quaternion::identity(), Quaternion::new(0.0, 0.0, 0.0, 0.0))
    }

    /// Dual quaternion with a zero dual part
    ///
    /// Used to report an orientation-only error in pose form.
    pub fn from_primary(primary: Quaternion<f64>) -> Self {
        Self::new(primary, Quaternion::new(0.0, 0.0, 0.0, 0.0))
    }

    /// Build from (wp, xp, yp, zp, wd, xd, yd, zd)
    pub fn from_vec8(v: [f64; 8]) -> Self {
        Self::new(
            Quaternion::new(v[0], v[1], v[2], v[3]),
            Quaternion::new(v[4], v[5], v[6], v[7]),
        )
    }

    /// Components as (wp, xp, yp, zp, wd, xd, yd, zd)
    pub fn vec8(&self) -> [f64; 8] {
        let p = quaternion_wxyz(&self.primary);
        let d = quaternion_wxyz(&self.dual);
        [p[0], p[1], p[2], p[3], d[0], d[1], d[2], d[3]]
    }

    /// Pose from a translation applied first, then a rotation
    ///
    /// # Arguments
    /// * `translation` - Translation [m]
    /// * `rotation` - Orientation
    pub fn from_translation_rotation(
        translation: &Vector3<f64>,
        rotation: &UnitQuaternion<f64>,
    ) -> Self {
        let r = *rotation.quaternion();
        let t = Quaternion::from_imag(*translation);
        Self::new(r, (t * r) * 0.5)
    }

    /// Translation encoded in the pose: t = 2·D ⊗ P*
    pub fn translation(&self) -> Vector3<f64> {
        (self.dual * self.primary.conjugate() * 2.0).imag()
    }

    /// Rotation part as a (possibly non-unit) quaternion
    pub fn rotation(&self) -> Quaternion<f64> {
        self.primary
    }

    /// Roll-pitch-yaw of the primary part [rad]
    ///
    /// Not unique at gimbal lock (pitch = ±90°).
    pub fn rpy(&self) -> Vector3<f64> {
        quaternion_to_rpy(&UnitQuaternion::from_quaternion(self.primary))
    }

    /// Dual quaternion conjugate: P* + ε·D*
    pub fn conjugate(&self) -> Self {
        Self::new(self.primary.conjugate(), self.dual.conjugate())
    }

    /// Elementwise product of the 8 components
    pub fn component_mul(&self, other: &Self) -> Self {
        Self::new(
            quaternion_component_mul(&self.primary, &other.primary),
            quaternion_component_mul(&self.dual, &other.dual),
        )
    }
}

impl Default for DualQuaternion {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for DualQuaternion {
    type Output = DualQuaternion;

    /// (Pa + εDa)(Pb + εDb) = PaPb + ε(PaDb + DaPb)
    fn mul(self, rhs: DualQuaternion) -> DualQuaternion {
        DualQuaternion::new(
            self.primary * rhs.primary,
            self.primary * rhs.dual + self.dual * rhs.primary,
        )
    }
}
