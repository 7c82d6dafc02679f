//! Control Property Tests
//!
//! Checks the behaviour of the leveling controller as a whole:
//! 1. Null-space projector properties for arbitrary mounting geometry
//! 2. Zero command at the setpoint
//! 3. Differential response to a roll disturbance
//! 4. Null-space bias vanishing at the joint targets
//! 5. Setpoint read-back

use approx::assert_relative_eq;
use nalgebra::{Matrix4, UnitQuaternion, Vector3, Vector4};

use leveler_core::control::{ControlLaw, ControlMode, ModeDispatcher, NullSpaceGoal, PoseGains, PoseSetpoint, INVALID_MODE};
use leveler_core::kinematics::{KinematicModel, MountingGeometry};
use leveler_core::state::{ChassisState, SensorSnapshot, StateAggregator};

fn default_law() -> ControlLaw {
    let model = KinematicModel::new(MountingGeometry::default()).unwrap();
    ControlLaw::new(model, NullSpaceGoal::default())
}

fn chassis_state(orientation: UnitQuaternion<f64>, height: f64, joints: Vec<f64>) -> ChassisState {
    let snapshot = SensorSnapshot {
        orientation: Some(orientation),
        ground_distance: Some(Vector3::new(0.0, 0.0, height)),
        joint_positions: Some(joints),
    };
    StateAggregator::default().aggregate(&snapshot).unwrap()
}

mod kinematic_tests {
    use super::*;

    fn geometries() -> Vec<MountingGeometry> {
        vec![
            MountingGeometry::default(),
            MountingGeometry::new([
                Vector3::new(0.40, 0.30, 0.0),
                Vector3::new(0.35, -0.20, 0.0),
                Vector3::new(-0.10, 0.25, 0.0),
                Vector3::new(-0.45, -0.30, 0.0),
            ]),
            MountingGeometry::new([
                Vector3::new(1.0, 0.01, 0.2),
                Vector3::new(0.9, -0.01, -0.2),
                Vector3::new(-1.1, 0.02, 0.0),
                Vector3::new(-0.8, -0.02, 0.1),
            ]),
        ]
    }

    #[test]
    fn test_projector_idempotent_for_any_geometry() {
        for geometry in geometries() {
            let model = KinematicModel::new(geometry).unwrap();
            let p = model.null_space_projector();

            assert_relative_eq!(p * p, *p, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_projector_orthogonal_for_any_geometry() {
        for geometry in geometries() {
            let model = KinematicModel::new(geometry).unwrap();

            let product = model.j_ori_dagger() * model.j_ori() * model.null_space_projector();

            assert_relative_eq!(product, Matrix4::zeros(), epsilon = 1e-9);
        }
    }
}

mod control_law_tests {
    use super::*;

    #[test]
    fn test_articulation_zero_command_at_identity_setpoint() {
        let law = default_law();
        let setpoint = PoseSetpoint::new(&Vector3::zeros(), &Vector3::zeros());
        let current = chassis_state(UnitQuaternion::identity(), 0.0, vec![0.0; 8]);

        assert_relative_eq!(current.pose.translation(), setpoint.translation(), epsilon = 1e-12);
        assert_relative_eq!(current.pose.rotation(), setpoint.pose().rotation(), epsilon = 1e-12);

        let out = law.evaluate(ControlMode::Articulation, &current, &setpoint, &PoseGains::default());

        assert_relative_eq!(out.command, Vector4::zeros(), epsilon = 1e-12);
    }

    #[test]
    fn test_roll_disturbance_differential_pattern() {
        let law = default_law();
        let setpoint = PoseSetpoint::new(&Vector3::new(0.0, 0.0, 0.3), &Vector3::new(0.0, 0.05, 0.0));
        let gains = PoseGains::new(&Vector3::new(2.0, 4.0, 1.0), &Vector3::new(1.0, 1.0, 0.8));

        let roll = UnitQuaternion::from_euler_angles(10.0_f64.to_radians(), 0.0, 0.0);
        let current = chassis_state(setpoint.orientation() * roll, 0.3, vec![0.0; 8]);

        let out = law.evaluate(ControlMode::Orientation, &current, &setpoint, &gains);

        // Left units (y > 0) move down, right units (y < 0) move up
        assert!(out.command[0] < 0.0 && out.command[2] < 0.0);
        assert!(out.command[1] > 0.0 && out.command[3] > 0.0);

        let expected = 0.2505 * 2.0 * 5.0_f64.to_radians().sin();
        for v in out.command.iter() {
            assert_relative_eq!(v.abs(), expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_roll_response_scales_with_roll_gain() {
        let law = default_law();
        let setpoint = PoseSetpoint::new(&Vector3::new(0.0, 0.0, 0.3), &Vector3::zeros());
        let roll = UnitQuaternion::from_euler_angles(10.0_f64.to_radians(), 0.0, 0.0);
        let current = chassis_state(roll, 0.3, vec![0.0; 8]);

        let base = PoseGains::new(&Vector3::new(2.0, 4.0, 1.0), &Vector3::new(1.0, 1.0, 0.8));
        let doubled = PoseGains::new(&Vector3::new(4.0, 4.0, 1.0), &Vector3::new(1.0, 1.0, 0.8));

        let a = law.evaluate(ControlMode::Orientation, &current, &setpoint, &base);
        let b = law.evaluate(ControlMode::Orientation, &current, &setpoint, &doubled);

        assert_relative_eq!(b.command, 2.0 * a.command, epsilon = 1e-12);
    }

    #[test]
    fn test_heading_does_not_affect_command() {
        let law = default_law();
        let setpoint = PoseSetpoint::default();
        let gains = PoseGains::default();

        let a = chassis_state(UnitQuaternion::from_euler_angles(0.1, -0.05, 0.0), 0.3, vec![0.0; 8]);
        let b = chassis_state(UnitQuaternion::from_euler_angles(0.1, -0.05, 2.2), 0.3, vec![0.0; 8]);

        for mode in ControlMode::ALL {
            let out_a = law.evaluate(mode, &a, &setpoint, &gains);
            let out_b = law.evaluate(mode, &b, &setpoint, &gains);
            assert_relative_eq!(out_a.command, out_b.command, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_negated_orientation_gives_same_command() {
        let law = default_law();
        let setpoint = PoseSetpoint::default();
        let gains = PoseGains::default();

        let q = UnitQuaternion::from_euler_angles(0.1, 0.0, 0.3);
        let negated = UnitQuaternion::new_unchecked(-q.into_inner());
        let a = chassis_state(q, 0.25, vec![0.0; 8]);
        let b = chassis_state(negated, 0.25, vec![0.0; 8]);

        for mode in ControlMode::ALL {
            let out_a = law.evaluate(mode, &a, &setpoint, &gains);
            let out_b = law.evaluate(mode, &b, &setpoint, &gains);
            assert_relative_eq!(out_a.command, out_b.command, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_null_space_at_joint_targets_matches_orientation() {
        let law = default_law();
        let setpoint = PoseSetpoint::default();
        let gains = PoseGains::default();

        let target = law.null_space_goal().joint_targets;
        // Raw joint readings that the default sign convention maps onto the targets
        let joints = vec![0.0, 0.0, 0.0, 0.0, target[0], -target[1], target[2], -target[3]];
        let current = chassis_state(UnitQuaternion::from_euler_angles(0.12, 0.07, 0.4), 0.25, joints);

        let plain = law.evaluate(ControlMode::Orientation, &current, &setpoint, &gains);
        let null_space = law.evaluate(ControlMode::OrientationNullSpace, &current, &setpoint, &gains);

        assert_eq!(null_space.command, plain.command);
    }
}

mod setpoint_tests {
    use super::*;

    #[test]
    fn test_get_after_set_away_from_gimbal_lock() {
        let setpoint = PoseSetpoint::new(&Vector3::new(0.1, 0.0, 0.3), &Vector3::new(0.0, 0.2, 0.0));

        assert_relative_eq!(setpoint.translation(), Vector3::new(0.1, 0.0, 0.3), epsilon = 1e-9);
        assert_relative_eq!(setpoint.rpy(), Vector3::new(0.0, 0.2, 0.0), epsilon = 1e-9);
    }

    #[test]
    fn test_gimbal_lock_rotation_survives() {
        // Near pitch = 90° the RPY triple is ambiguous but the rotation is not
        let rpy = Vector3::new(0.3, std::f64::consts::FRAC_PI_2, 0.1);
        let setpoint = PoseSetpoint::new(&Vector3::zeros(), &rpy);

        let rebuilt = PoseSetpoint::new(&Vector3::zeros(), &setpoint.rpy());

        assert!(setpoint.orientation().angle_to(rebuilt.orientation()) < 1e-4);
    }
}

mod mode_tests {
    use super::*;

    #[test]
    fn test_invalid_modes_keep_previous_mode() {
        let mut dispatcher = ModeDispatcher::default();
        dispatcher.set_mode(3);

        for value in [0, 4, -7, 100] {
            assert_eq!(dispatcher.set_mode(value), INVALID_MODE);
            assert_eq!(dispatcher.mode(), ControlMode::Articulation);
        }
    }
}
