//! Shared node context
//!
//! All state mutated outside the control loop lives here: setpoint, gains,
//! control mode, status flags and the latest sensor readings. Each record
//! sits behind its own mutex and is only ever read or replaced whole, so
//! the loop never sees a half-updated record.
//!
//! Records read at different moments of a tick may come from different
//! updates (a setpoint and a gain change landing between the two reads).
//! That is acceptable for a continuous feedback loop; the next tick sees
//! both.

use std::sync::Arc;

use nalgebra::{UnitQuaternion, Vector3};
use parking_lot::Mutex;

use leveler_core::control::{ControlMode, ModeDispatcher, PoseGains, PoseSetpoint};
use leveler_core::state::SensorSnapshot;
use leveler_core::LevelerError;

use crate::config::NodeConfig;
use crate::status::NodeStatus;

/// Context handle shared between the loop, sensor feeds and the control surface
pub type SharedContext = Arc<NodeContext>;

/// Mutable node state
#[derive(Debug)]
pub struct NodeContext {
    setpoint: Mutex<PoseSetpoint>,
    gains: Mutex<PoseGains>,
    mode: Mutex<ModeDispatcher>,
    status: Mutex<NodeStatus>,
    orientation: Mutex<Option<UnitQuaternion<f64>>>,
    ground_distance: Mutex<Option<Vector3<f64>>>,
    joint_positions: Mutex<Option<Vec<f64>>>,
}

impl NodeContext {
    pub fn new(setpoint: PoseSetpoint, gains: PoseGains, mode: ControlMode, status: NodeStatus) -> Self {
        Self {
            setpoint: Mutex::new(setpoint),
            gains: Mutex::new(gains),
            mode: Mutex::new(ModeDispatcher::new(mode)),
            status: Mutex::new(status),
            orientation: Mutex::new(None),
            ground_distance: Mutex::new(None),
            joint_positions: Mutex::new(None),
        }
    }

    /// Context seeded with the configured setpoint, gains, mode and activation
    pub fn from_config(config: &NodeConfig) -> Result<Self, LevelerError> {
        Ok(Self::new(
            config.setpoint.to_setpoint(),
            config.gains.to_gains(),
            config.initial_mode()?,
            NodeStatus::new(config.node.start_active),
        ))
    }

    pub fn shared(self) -> SharedContext {
        Arc::new(self)
    }

    // === Setpoint & gains ===

    pub fn setpoint(&self) -> PoseSetpoint {
        *self.setpoint.lock()
    }

    pub fn replace_setpoint(&self, setpoint: PoseSetpoint) {
        *self.setpoint.lock() = setpoint;
    }

    pub fn gains(&self) -> PoseGains {
        *self.gains.lock()
    }

    pub fn replace_gains(&self, gains: PoseGains) {
        *self.gains.lock() = gains;
    }

    // === Control mode ===

    pub fn mode(&self) -> ControlMode {
        self.mode.lock().mode()
    }

    /// Request a mode change; returns the accepted code or the invalid sentinel
    pub fn set_mode(&self, value: i32) -> i32 {
        self.mode.lock().set_mode(value)
    }

    // === Status ===

    pub fn status(&self) -> NodeStatus {
        *self.status.lock()
    }

    pub fn is_active(&self) -> bool {
        self.status.lock().active
    }

    pub fn set_active(&self, active: bool) {
        self.status.lock().active = active;
    }

    pub fn set_halt_cmd(&self, halt_cmd: bool) {
        self.status.lock().halt_cmd = halt_cmd;
    }

    // === Sensor readings ===

    pub fn update_orientation(&self, orientation: UnitQuaternion<f64>) {
        *self.orientation.lock() = Some(orientation);
    }

    pub fn update_ground_distance(&self, distance: Vector3<f64>) {
        *self.ground_distance.lock() = Some(distance);
    }

    pub fn update_joint_positions(&self, positions: Vec<f64>) {
        *self.joint_positions.lock() = Some(positions);
    }

    /// Copy of the latest readings
    pub fn snapshot(&self) -> SensorSnapshot {
        SensorSnapshot {
            orientation: *self.orientation.lock(),
            ground_distance: *self.ground_distance.lock(),
            joint_positions: self.joint_positions.lock().clone(),
        }
    }
}

impl Default for NodeContext {
    fn default() -> Self {
        Self::new(
            PoseSetpoint::default(),
            PoseGains::default(),
            ControlMode::default(),
            NodeStatus::default(),
        )
    }
}
