//! Chassis leveling kinematics
//!
//! Maps pose errors of the chassis to vertical velocities of the four
//! flipper units. Unit and chassis frames are assumed to share the same
//! orientation, so a unit mounted at ρᵢ = [xᵢ, yᵢ, zᵢ] sees a vertical
//! velocity
//!
//! ```text
//! vᵢ = ḣ + yᵢ·ω_roll − xᵢ·ω_pitch
//! ```
//!
//! for a height rate ḣ and small roll/pitch rates. Stacking the rows gives
//! the orientation map J_ori† (4×2) and the articulation map J_art† (4×3):
//!
//! ```text
//! J_ori†[i] = [yᵢ, −xᵢ]        J_art†[i] = [1, yᵢ, −xᵢ]
//! ```
//!
//! J_ori is the Moore–Penrose pseudo-inverse of J_ori† and the null-space
//! projector is P = I − J_ori†·J_ori.

use nalgebra::{Matrix2x4, Matrix4, Matrix4x2, Matrix4x3, Vector2, Vector3, Vector4};
use serde::{Deserialize, Serialize};

use crate::error::LevelerError;
use crate::NUM_UNITS;

/// Singular values below this are treated as zero by the pseudo-inverse
pub const PINV_EPSILON: f64 = 1e-9;

/// Mounting offsets of the flipper units in the chassis frame [m]
///
/// Unit order is front-left, front-right, rear-left, rear-right. The same
/// order indexes the command vector and the flipper joint angles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MountingGeometry {
    pub mounts: [Vector3<f64>; NUM_UNITS],
}

impl Default for MountingGeometry {
    fn default() -> Self {
        Self {
            mounts: [
                Vector3::new(0.2670, 0.2505, 0.0),
                Vector3::new(0.2670, -0.2505, 0.0),
                Vector3::new(-0.2670, 0.2505, 0.0),
                Vector3::new(-0.2670, -0.2505, 0.0),
            ],
        }
    }
}

impl MountingGeometry {
    pub fn new(mounts: [Vector3<f64>; NUM_UNITS]) -> Self {
        Self { mounts }
    }

    fn validate(&self) -> Result<(), LevelerError> {
        match self.mounts.iter().position(|m| !m.iter().all(|c| c.is_finite())) {
            Some(unit) => Err(LevelerError::NonFiniteGeometry { unit }),
            None => Ok(()),
        }
    }
}

/// Orientation Jacobian map J_ori† (roll/pitch rate -> unit velocities)
pub fn orientation_jacobian_dagger(geometry: &MountingGeometry) -> Matrix4x2<f64> {
    Matrix4x2::from_fn(|i, j| {
        let m = &geometry.mounts[i];
        if j == 0 { m.y } else { -m.x }
    })
}

/// Articulation Jacobian map J_art† (height/roll/pitch rate -> unit velocities)
pub fn articulation_jacobian_dagger(geometry: &MountingGeometry) -> Matrix4x3<f64> {
    Matrix4x3::from_fn(|i, j| {
        let m = &geometry.mounts[i];
        match j {
            0 => 1.0,
            1 => m.y,
            _ => -m.x,
        }
    })
}

/// Precomputed kinematics of the leveling controller
///
/// Built once at startup and read-only afterwards.
#[derive(Debug, Clone)]
pub struct KinematicModel {
    geometry: MountingGeometry,
    j_ori_dagger: Matrix4x2<f64>,
    j_ori: Matrix2x4<f64>,
    null_space_projector: Matrix4<f64>,
    j_art_dagger: Matrix4x3<f64>,
}

impl KinematicModel {
    /// Build the kinematic model from the mounting geometry
    ///
    /// Near-singular geometry is tolerated: singular values below
    /// [`PINV_EPSILON`] are zeroed in the pseudo-inverse. Geometry that gives
    /// no orientation authority at all (every unit on the chassis origin) or
    /// non-finite offsets are configuration errors.
    pub fn new(geometry: MountingGeometry) -> Result<Self, LevelerError> {
        geometry.validate()?;

        let j_ori_dagger = orientation_jacobian_dagger(&geometry);

        let rank = j_ori_dagger.rank(PINV_EPSILON);
        if rank == 0 {
            return Err(LevelerError::DegenerateGeometry { rank });
        }
        if rank < 2 {
            log::warn!(
                "Orientation Jacobian has rank {}; one tilt axis is not actuated",
                rank
            );
        }

        let j_ori = j_ori_dagger
            .pseudo_inverse(PINV_EPSILON)
            .map_err(|e| LevelerError::PseudoInverse(e.to_string()))?;

        let null_space_projector = Matrix4::identity() - j_ori_dagger * j_ori;
        let j_art_dagger = articulation_jacobian_dagger(&geometry);

        Ok(Self {
            geometry,
            j_ori_dagger,
            j_ori,
            null_space_projector,
            j_art_dagger,
        })
    }

    pub fn geometry(&self) -> &MountingGeometry {
        &self.geometry
    }

    pub fn j_ori_dagger(&self) -> &Matrix4x2<f64> {
        &self.j_ori_dagger
    }

    pub fn j_ori(&self) -> &Matrix2x4<f64> {
        &self.j_ori
    }

    pub fn null_space_projector(&self) -> &Matrix4<f64> {
        &self.null_space_projector
    }

    pub fn j_art_dagger(&self) -> &Matrix4x3<f64> {
        &self.j_art_dagger
    }

    /// Unit velocities for a roll/pitch control signal
    pub fn orientation_command(&self, u: &Vector2<f64>) -> Vector4<f64> {
        self.j_ori_dagger * u
    }

    /// Project a secondary objective onto the orientation task's null space
    pub fn project_null_space(&self, mu: &Vector4<f64>) -> Vector4<f64> {
        self.null_space_projector * mu
    }

    /// Unit velocities for a height/roll/pitch control signal
    pub fn articulation_command(&self, u: &Vector3<f64>) -> Vector4<f64> {
        self.j_art_dagger * u
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Matrix2;

    #[test]
    fn test_orientation_jacobian_rows() {
        let model = KinematicModel::new(MountingGeometry::default()).unwrap();
        let j = model.j_ori_dagger();

        // Front-left unit at (0.267, 0.2505)
        assert_relative_eq!(j[(0, 0)], 0.2505, epsilon = 1e-12);
        assert_relative_eq!(j[(0, 1)], -0.2670, epsilon = 1e-12);
        // Rear-right unit at (-0.267, -0.2505)
        assert_relative_eq!(j[(3, 0)], -0.2505, epsilon = 1e-12);
        assert_relative_eq!(j[(3, 1)], 0.2670, epsilon = 1e-12);
    }

    #[test]
    fn test_pseudo_inverse_is_left_inverse() {
        let model = KinematicModel::new(MountingGeometry::default()).unwrap();

        let product = model.j_ori() * model.j_ori_dagger();

        assert_relative_eq!(product, Matrix2::identity(), epsilon = 1e-10);
    }

    #[test]
    fn test_projector_idempotent() {
        let model = KinematicModel::new(MountingGeometry::default()).unwrap();
        let p = model.null_space_projector();

        assert_relative_eq!(p * p, *p, epsilon = 1e-10);
    }

    #[test]
    fn test_projector_orthogonal_to_orientation_range() {
        let model = KinematicModel::new(MountingGeometry::default()).unwrap();

        let product = model.j_ori_dagger() * model.j_ori() * model.null_space_projector();

        assert_relative_eq!(product, Matrix4::zeros(), epsilon = 1e-10);
    }

    #[test]
    fn test_asymmetric_geometry_projector() {
        let geometry = MountingGeometry::new([
            Vector3::new(0.31, 0.22, -0.05),
            Vector3::new(0.27, -0.26, 0.02),
            Vector3::new(-0.25, 0.21, 0.0),
            Vector3::new(-0.33, -0.24, 0.01),
        ]);
        let model = KinematicModel::new(geometry).unwrap();
        let p = model.null_space_projector();

        assert_relative_eq!(p * p, *p, epsilon = 1e-10);
        assert_relative_eq!(
            model.j_ori_dagger() * model.j_ori() * p,
            Matrix4::zeros(),
            epsilon = 1e-10
        );
        // Rank 2 task in a 4D actuator space leaves a 2D null space
        assert_relative_eq!(p.trace(), 2.0, epsilon = 1e-10);
    }

    #[test]
    fn test_collinear_geometry_degrades_gracefully() {
        // All units on the x axis: no roll authority
        let geometry = MountingGeometry::new([
            Vector3::new(0.3, 0.0, 0.0),
            Vector3::new(0.1, 0.0, 0.0),
            Vector3::new(-0.1, 0.0, 0.0),
            Vector3::new(-0.3, 0.0, 0.0),
        ]);

        let model = KinematicModel::new(geometry).unwrap();
        let p = model.null_space_projector();

        assert!(model.j_ori().iter().all(|v| v.is_finite()));
        assert_relative_eq!(p * p, *p, epsilon = 1e-10);
        assert_relative_eq!(p.trace(), 3.0, epsilon = 1e-10);
    }

    #[test]
    fn test_all_units_at_origin_is_error() {
        let geometry = MountingGeometry::new([Vector3::zeros(); NUM_UNITS]);

        let result = KinematicModel::new(geometry);

        assert!(matches!(result, Err(LevelerError::DegenerateGeometry { rank: 0 })));
    }

    #[test]
    fn test_non_finite_geometry_is_error() {
        let mut geometry = MountingGeometry::default();
        geometry.mounts[2].x = f64::NAN;

        let result = KinematicModel::new(geometry);

        assert_eq!(result.unwrap_err(), LevelerError::NonFiniteGeometry { unit: 2 });
    }

    #[test]
    fn test_articulation_pure_height() {
        let model = KinematicModel::new(MountingGeometry::default()).unwrap();

        let v = model.articulation_command(&Vector3::new(0.5, 0.0, 0.0));

        assert_relative_eq!(v, Vector4::repeat(0.5), epsilon = 1e-12);
    }
}
