//! Runtime control surface
//!
//! Synchronous request/response operations on the shared context. Every
//! request replaces or reads a whole record and takes effect on the next
//! loop tick. Setpoint and gain values are not validated: they reach the
//! control law exactly as given.

use nalgebra::Vector3;

use leveler_core::control::{PoseGains, PoseSetpoint};

use crate::context::SharedContext;
use crate::status::NodeStatus;

/// Requests accepted by the control surface
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceRequest {
    /// Enable or disable the control loop
    SetActive(bool),
    /// Read the status flags
    GetStatus,
    /// Set the halt override flag
    SetHaltCmd(bool),
    /// Replace the pose setpoint: translation [m] + roll-pitch-yaw [rad]
    SetPoseSetPoint {
        translation: Vector3<f64>,
        orientation: Vector3<f64>,
    },
    /// Read the pose setpoint
    GetPoseSetPoint,
    /// Replace the gains: orientation (roll, pitch, yaw) + translation (x, y, z)
    SetPoseCtrlGain {
        kp_ori: Vector3<f64>,
        kp_tr: Vector3<f64>,
    },
    /// Read the gains
    GetPoseCtrlGain,
    /// Change the control mode by code
    SetCtrlType(i32),
    /// Read the control mode code
    GetCtrlType,
}

/// Responses of the control surface
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceResponse {
    /// Request applied
    Ok,
    /// Status flags as (name, value) pairs
    Status(Vec<(&'static str, bool)>),
    /// Pose setpoint (RPY reconstructed, ambiguous at gimbal lock)
    PoseSetPoint {
        translation: Vector3<f64>,
        orientation: Vector3<f64>,
    },
    /// Current gains
    PoseCtrlGain {
        kp_ori: Vector3<f64>,
        kp_tr: Vector3<f64>,
    },
    /// Mode code, or the invalid sentinel for a rejected change
    CtrlType(i32),
}

/// Control surface over the shared node context
#[derive(Debug, Clone)]
pub struct ControlService {
    ctx: SharedContext,
}

impl ControlService {
    pub fn new(ctx: SharedContext) -> Self {
        Self { ctx }
    }

    /// Dispatch a request
    pub fn handle(&self, request: ServiceRequest) -> ServiceResponse {
        match request {
            ServiceRequest::SetActive(active) => {
                self.set_active(active);
                ServiceResponse::Ok
            }
            ServiceRequest::GetStatus => ServiceResponse::Status(self.status().status_list()),
            ServiceRequest::SetHaltCmd(halt) => {
                self.set_halt_cmd(halt);
                ServiceResponse::Ok
            }
            ServiceRequest::SetPoseSetPoint { translation, orientation } => {
                self.set_pose_setpoint(&translation, &orientation);
                ServiceResponse::Ok
            }
            ServiceRequest::GetPoseSetPoint => {
                let (translation, orientation) = self.pose_setpoint();
                ServiceResponse::PoseSetPoint { translation, orientation }
            }
            ServiceRequest::SetPoseCtrlGain { kp_ori, kp_tr } => {
                self.set_pose_gains(&kp_ori, &kp_tr);
                ServiceResponse::Ok
            }
            ServiceRequest::GetPoseCtrlGain => {
                let (kp_ori, kp_tr) = self.pose_gains();
                ServiceResponse::PoseCtrlGain { kp_ori, kp_tr }
            }
            ServiceRequest::SetCtrlType(value) => ServiceResponse::CtrlType(self.set_control_mode(value)),
            ServiceRequest::GetCtrlType => ServiceResponse::CtrlType(self.control_mode()),
        }
    }

    pub fn set_active(&self, active: bool) {
        self.ctx.set_active(active);
        log::info!("Node active flag set to {}", active);
    }

    pub fn status(&self) -> NodeStatus {
        self.ctx.status()
    }

    pub fn set_halt_cmd(&self, halt: bool) {
        self.ctx.set_halt_cmd(halt);
        log::info!("Node haltCmd flag set to {}", halt);
    }

    /// Replace the pose setpoint
    pub fn set_pose_setpoint(&self, translation: &Vector3<f64>, orientation_rpy: &Vector3<f64>) {
        self.ctx.replace_setpoint(PoseSetpoint::new(translation, orientation_rpy));
        log::info!(
            "Pose setpoint set to translation {:?}, rpy {:?}",
            translation.as_slice(),
            orientation_rpy.as_slice()
        );
    }

    /// Translation and roll-pitch-yaw of the current setpoint
    pub fn pose_setpoint(&self) -> (Vector3<f64>, Vector3<f64>) {
        let setpoint = self.ctx.setpoint();
        (setpoint.translation(), setpoint.rpy())
    }

    /// Replace the gains
    pub fn set_pose_gains(&self, kp_ori: &Vector3<f64>, kp_tr: &Vector3<f64>) {
        self.ctx.replace_gains(PoseGains::new(kp_ori, kp_tr));
        log::info!(
            "Pose gains set to orientation {:?}, translation {:?}",
            kp_ori.as_slice(),
            kp_tr.as_slice()
        );
    }

    /// Orientation and translation gains
    pub fn pose_gains(&self) -> (Vector3<f64>, Vector3<f64>) {
        let gains = self.ctx.gains();
        (gains.orientation_gains(), gains.translation_gains())
    }

    /// Change the control mode; returns the accepted code or -1
    pub fn set_control_mode(&self, value: i32) -> i32 {
        self.ctx.set_mode(value)
    }

    pub fn control_mode(&self) -> i32 {
        self.ctx.mode().code()
    }
}
