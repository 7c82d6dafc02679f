//! Control law evaluation
//!
//! Every mode computes its error setpoint-relative:
//!
//! ```text
//! Orientation:   e_o = q_sp* ⊗ q_R
//!                u_o = (k_o* ∘ e_o)[x, y]          (roll, pitch only)
//!                v   = J_ori† · u_o
//!
//! Null space:    v  += P · μ
//!
//! Articulation:  e_a = x_sp* ⊗ x_R
//!                u_a = k_a* ∘ e_a                  (elementwise, 8 components)
//!                v   = J_art† · [t_z(u_a), u_a.x, u_a.y]
//! ```
//!
//! Conjugating a gain negates its vector part, so the vector components of
//! the control signal are −k·e: negative feedback on the error. Yaw is
//! never actuated.

use nalgebra::{Quaternion, Vector2, Vector3, Vector4};

use crate::kinematics::KinematicModel;
use crate::math::{quaternion_component_mul, DualQuaternion};
use crate::state::ChassisState;

use super::{ControlMode, NullSpaceGoal, PoseGains, PoseSetpoint};

/// Result of one control law evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlOutput {
    /// Vertical velocity command per unit
    pub command: Vector4<f64>,
    /// Pose error; orientation modes leave the dual part at zero
    pub error: DualQuaternion,
}

/// Evaluates the control law of the active mode
#[derive(Debug, Clone)]
pub struct ControlLaw {
    model: KinematicModel,
    null_space_goal: NullSpaceGoal,
}

impl ControlLaw {
    pub fn new(model: KinematicModel, null_space_goal: NullSpaceGoal) -> Self {
        Self {
            model,
            null_space_goal,
        }
    }

    pub fn model(&self) -> &KinematicModel {
        &self.model
    }

    pub fn null_space_goal(&self) -> &NullSpaceGoal {
        &self.null_space_goal
    }

    /// Compute the per-unit command for `mode`
    ///
    /// # Arguments
    /// * `mode` - Active control mode
    /// * `state` - De-yawed chassis state
    /// * `setpoint` - Desired pose
    /// * `gains` - Proportional gains
    pub fn evaluate(
        &self,
        mode: ControlMode,
        state: &ChassisState,
        setpoint: &PoseSetpoint,
        gains: &PoseGains,
    ) -> ControlOutput {
        match mode {
            ControlMode::Orientation => self.orientation(state, setpoint, gains),
            ControlMode::OrientationNullSpace => {
                let mut output = self.orientation(state, setpoint, gains);
                output.command += self.null_space_command(state);
                output
            }
            ControlMode::Articulation => self.articulation(state, setpoint, gains),
        }
    }

    /// Orientation error e_o = q_sp* ⊗ q_R
    pub fn orientation_error(setpoint: &PoseSetpoint, state: &ChassisState) -> Quaternion<f64> {
        setpoint.orientation().quaternion().conjugate() * state.orientation.quaternion()
    }

    /// Pose error e_a = x_sp* ⊗ x_R
    pub fn pose_error(setpoint: &PoseSetpoint, state: &ChassisState) -> DualQuaternion {
        setpoint.pose().conjugate() * state.pose
    }

    fn orientation(
        &self,
        state: &ChassisState,
        setpoint: &PoseSetpoint,
        gains: &PoseGains,
    ) -> ControlOutput {
        let error = Self::orientation_error(setpoint, state);
        let u = quaternion_component_mul(&gains.orientation().conjugate(), &error);

        ControlOutput {
            command: self.model.orientation_command(&Vector2::new(u.i, u.j)),
            error: DualQuaternion::from_primary(error),
        }
    }

    /// Projected flipper-joint bias P · μ
    ///
    /// Zero when the flipper angles are unavailable.
    pub fn null_space_command(&self, state: &ChassisState) -> Vector4<f64> {
        match &state.flipper_angles {
            Some(angles) => self.model.project_null_space(&self.null_space_goal.bias(angles)),
            None => Vector4::zeros(),
        }
    }

    fn articulation(
        &self,
        state: &ChassisState,
        setpoint: &PoseSetpoint,
        gains: &PoseGains,
    ) -> ControlOutput {
        let error = Self::pose_error(setpoint, state);
        let u = gains.pose().conjugate().component_mul(&error);

        let translation = u.translation();
        let rotation = u.rotation();
        let signal = Vector3::new(translation.z, rotation.i, rotation.j);

        ControlOutput {
            command: self.model.articulation_command(&signal),
            error,
        }
    }
}
