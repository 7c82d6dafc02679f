//! Loop driver
//!
//! Runs the control cycle at a fixed rate. A tick does nothing while the
//! node is inactive or while any sensor reading has never arrived; once
//! all three are present every tick evaluates the active control law and
//! publishes a [`TelemetryFrame`], reusing stale readings if a feed stops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use nalgebra::Vector3;

use leveler_core::control::{ControlLaw, ControlOutput, PoseGains, PoseSetpoint};
use leveler_core::kinematics::KinematicModel;
use leveler_core::math::DualQuaternion;
use leveler_core::state::{ChassisState, StateAggregator};

use crate::config::NodeConfig;
use crate::context::SharedContext;
use crate::error::NodeError;
use crate::params::{wait_for_parameter, ParameterSource, ParameterWait};
use crate::telemetry::{DualQuaternionStamped, Telemetry, TelemetryFrame};

/// Fixed-rate control loop
pub struct LoopDriver<T: Telemetry> {
    ctx: SharedContext,
    law: ControlLaw,
    aggregator: StateAggregator,
    telemetry: T,
    params: Arc<dyn ParameterSource>,
    drive_side_param: String,
    drive_side: f64,
    frame_id: String,
    period: Duration,
}

impl<T: Telemetry> LoopDriver<T> {
    /// Startup: build the kinematic model and wait for the heading polarity
    ///
    /// Invalid loop timing, degenerate mounting geometry and a parameter
    /// that never appears are all fatal.
    pub fn from_config(
        config: &NodeConfig,
        ctx: SharedContext,
        params: Arc<dyn ParameterSource>,
        telemetry: T,
    ) -> Result<Self, NodeError> {
        config.node.validate()?;
        let model = KinematicModel::new(config.geometry.to_geometry())?;
        for (i, mount) in model.geometry().mounts.iter().enumerate() {
            log::info!("  Unit {}: mount ({:.4}, {:.4}, {:.4})", i, mount.x, mount.y, mount.z);
        }
        log::debug!("J_ori_dagger = {}", model.j_ori_dagger());
        log::debug!("J_ori = {}", model.j_ori());

        let wait = ParameterWait {
            timeout: config.node.param_wait_timeout(),
            initial_backoff: Duration::from_millis(config.node.param_wait_initial_backoff_ms),
            max_backoff: Duration::from_millis(config.node.param_wait_max_backoff_ms),
        };
        let drive_side = wait_for_parameter(params.as_ref(), &config.node.drive_side_param, wait)?;

        Ok(Self {
            ctx,
            law: ControlLaw::new(model, config.null_space.to_goal()),
            aggregator: StateAggregator::new(config.geometry.joint_signs()),
            telemetry,
            params,
            drive_side_param: config.node.drive_side_param.clone(),
            drive_side,
            frame_id: config.node.name.clone(),
            period: config.node.period(),
        })
    }

    pub fn telemetry(&self) -> &T {
        &self.telemetry
    }

    pub fn law(&self) -> &ControlLaw {
        &self.law
    }

    /// Last heading polarity read
    pub fn drive_side(&self) -> f64 {
        self.drive_side
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Run one control cycle
    ///
    /// Returns the published frame, or `None` for an idle tick.
    pub fn tick(&mut self) -> Result<Option<TelemetryFrame>, NodeError> {
        self.refresh_drive_side();

        if !self.ctx.is_active() {
            return Ok(None);
        }

        let snapshot = self.ctx.snapshot();
        let Some(state) = self.aggregator.aggregate(&snapshot) else {
            log::trace!("Waiting for sensors: {:?}", snapshot.missing());
            return Ok(None);
        };

        let setpoint = self.ctx.setpoint();
        let gains = self.ctx.gains();
        let mode = self.ctx.mode();

        let output = self.law.evaluate(mode, &state, &setpoint, &gains);

        let frame = self.frame(&state, &setpoint, &gains, &output);
        self.telemetry.publish(frame.clone())?;
        Ok(Some(frame))
    }

    /// Tick at the configured rate until `running` is cleared
    pub fn run(&mut self, running: &AtomicBool) -> Result<(), NodeError> {
        log::info!(
            "Control loop running at {:.1} Hz",
            1.0 / self.period.as_secs_f64()
        );

        while running.load(Ordering::Relaxed) {
            let tick_start = Instant::now();

            self.tick()?;

            if let Some(remaining) = self.period.checked_sub(tick_start.elapsed()) {
                thread::sleep(remaining);
            }
        }

        log::info!("Control loop stopped");
        Ok(())
    }

    fn refresh_drive_side(&mut self) {
        let Some(value) = self.params.get(&self.drive_side_param) else {
            return;
        };
        if value != self.drive_side {
            log::debug!("Drive side changed {} -> {}", self.drive_side, value);
            self.drive_side = value;
        }
    }

    fn frame(
        &self,
        state: &ChassisState,
        setpoint: &PoseSetpoint,
        gains: &PoseGains,
        output: &ControlOutput,
    ) -> TelemetryFrame {
        let stamp = unix_time();
        let stamped = |dq: &DualQuaternion| DualQuaternionStamped::new(stamp, &self.frame_id, dq);

        log::trace!("cmd = {:?}", output.command.as_slice());

        TelemetryFrame {
            stamp,
            frame_id: self.frame_id.clone(),
            command: std::array::from_fn(|i| Vector3::new(0.0, 0.0, output.command[i])),
            pose_current: stamped(&state.pose),
            pose_setpoint: stamped(setpoint.pose()),
            pose_error: stamped(&output.error),
            gain: stamped(gains.pose()),
            drive_side: self.drive_side,
        }
    }
}

/// Wall-clock seconds since the UNIX epoch, 0 if the clock is before it
fn unix_time() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::NodeContext;
    use crate::params::StaticParameters;
    use crate::telemetry::RecordingTelemetry;

    fn params(drive_side: f64) -> StaticParameters {
        let params = StaticParameters::new();
        params.set("/rosi/forward_side", drive_side);
        params
    }

    #[test]
    fn test_degenerate_geometry_is_fatal() {
        let mut config = NodeConfig::default();
        config.geometry.mounts = [[0.0; 3]; 4];

        let result = LoopDriver::from_config(
            &config,
            NodeContext::default().shared(),
            Arc::new(params(1.0)),
            RecordingTelemetry::new(),
        );

        assert!(matches!(result, Err(NodeError::Core(_))));
    }

    #[test]
    fn test_invalid_rate_is_error() {
        let mut config = NodeConfig::default();
        config.node.rate_hz = 0.0;

        let result = LoopDriver::from_config(
            &config,
            NodeContext::default().shared(),
            Arc::new(params(1.0)),
            RecordingTelemetry::new(),
        );

        assert!(matches!(result, Err(NodeError::InvalidConfig(_))));
    }

    #[test]
    fn test_negative_param_timeout_is_error() {
        let mut config = NodeConfig::default();
        config.node.param_wait_timeout_s = -0.5;

        let result = LoopDriver::from_config(
            &config,
            NodeContext::default().shared(),
            Arc::new(StaticParameters::new()),
            RecordingTelemetry::new(),
        );

        assert!(matches!(result, Err(NodeError::InvalidConfig(_))));
    }

    #[test]
    fn test_drive_side_reread_every_tick() {
        let params = params(1.0);
        let mut driver = LoopDriver::from_config(
            &NodeConfig::default(),
            NodeContext::default().shared(),
            Arc::new(params.clone()),
            RecordingTelemetry::new(),
        )
        .unwrap();
        assert_eq!(driver.drive_side(), 1.0);

        params.set("/rosi/forward_side", -1.0);
        driver.tick().unwrap();
        assert_eq!(driver.drive_side(), -1.0);

        // Absent value keeps the previous one
        params.remove("/rosi/forward_side");
        driver.tick().unwrap();
        assert_eq!(driver.drive_side(), -1.0);
    }
}
