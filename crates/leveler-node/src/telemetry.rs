//! Telemetry boundary
//!
//! One [`TelemetryFrame`] is produced per tick that actually runs. Frames
//! are handed to a [`Telemetry`] sink; what the sink does with them
//! (log, forward, record) is up to the implementation.

use crossbeam_channel::Sender;
use nalgebra::{Vector3, Vector4};
use serde::{Deserialize, Serialize};

use leveler_core::math::DualQuaternion;

use crate::error::NodeError;

/// Timestamped dual quaternion, components in (wp, xp, yp, zp, wd, xd, yd, zd) order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DualQuaternionStamped {
    /// Wall-clock publish time, seconds since the UNIX epoch
    pub stamp: f64,
    /// Emitting node
    pub frame_id: String,
    pub wp: f64,
    pub xp: f64,
    pub yp: f64,
    pub zp: f64,
    pub wd: f64,
    pub xd: f64,
    pub yd: f64,
    pub zd: f64,
}

impl DualQuaternionStamped {
    pub fn new(stamp: f64, frame_id: &str, dq: &DualQuaternion) -> Self {
        let [wp, xp, yp, zp, wd, xd, yd, zd] = dq.vec8();
        Self {
            stamp,
            frame_id: frame_id.to_string(),
            wp,
            xp,
            yp,
            zp,
            wd,
            xd,
            yd,
            zd,
        }
    }

    pub fn dual_quaternion(&self) -> DualQuaternion {
        DualQuaternion::from_vec8([
            self.wp, self.xp, self.yp, self.zp, self.wd, self.xd, self.yd, self.zd,
        ])
    }
}

/// Output of one control tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    /// Wall-clock publish time, seconds since the UNIX epoch
    pub stamp: f64,
    /// Emitting node
    pub frame_id: String,
    /// Velocity command per unit; only z is populated
    pub command: [Vector3<f64>; 4],
    pub pose_current: DualQuaternionStamped,
    pub pose_setpoint: DualQuaternionStamped,
    /// Dual part is zero in the orientation modes
    pub pose_error: DualQuaternionStamped,
    pub gain: DualQuaternionStamped,
    /// Last heading polarity read (informational)
    pub drive_side: f64,
}

impl TelemetryFrame {
    /// Vertical velocity command per unit
    pub fn vertical_command(&self) -> Vector4<f64> {
        Vector4::from_fn(|i, _| self.command[i].z)
    }
}

/// Receives telemetry frames
pub trait Telemetry: Send {
    fn publish(&mut self, frame: TelemetryFrame) -> Result<(), NodeError>;
}

/// Writes each frame to the log at trace level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTelemetry;

impl Telemetry for LogTelemetry {
    fn publish(&mut self, frame: TelemetryFrame) -> Result<(), NodeError> {
        let cmd = frame.vertical_command();
        log::trace!(
            "[{}] t={:.3} cmd=[{:.4}, {:.4}, {:.4}, {:.4}] err=[{:.4}, {:.4}, {:.4}, {:.4}]",
            frame.frame_id,
            frame.stamp,
            cmd[0],
            cmd[1],
            cmd[2],
            cmd[3],
            frame.pose_error.wp,
            frame.pose_error.xp,
            frame.pose_error.yp,
            frame.pose_error.zp,
        );
        Ok(())
    }
}

/// Forwards frames over a channel
#[derive(Debug, Clone)]
pub struct ChannelTelemetry {
    tx: Sender<TelemetryFrame>,
}

impl ChannelTelemetry {
    pub fn new(tx: Sender<TelemetryFrame>) -> Self {
        Self { tx }
    }
}

impl Telemetry for ChannelTelemetry {
    fn publish(&mut self, frame: TelemetryFrame) -> Result<(), NodeError> {
        self.tx
            .send(frame)
            .map_err(|_| NodeError::ChannelClosed("telemetry"))
    }
}

/// Keeps every frame in memory
#[derive(Debug, Clone, Default)]
pub struct RecordingTelemetry {
    pub frames: Vec<TelemetryFrame>,
}

impl RecordingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Telemetry for RecordingTelemetry {
    fn publish(&mut self, frame: TelemetryFrame) -> Result<(), NodeError> {
        self.frames.push(frame);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::UnitQuaternion;

    fn frame(command: Vector4<f64>) -> TelemetryFrame {
        let pose = DualQuaternionStamped::new(1.5, "chassis_control", &DualQuaternion::identity());
        TelemetryFrame {
            stamp: 1.5,
            frame_id: "chassis_control".to_string(),
            command: std::array::from_fn(|i| Vector3::new(0.0, 0.0, command[i])),
            pose_current: pose.clone(),
            pose_setpoint: pose.clone(),
            pose_error: pose.clone(),
            gain: pose,
            drive_side: 1.0,
        }
    }

    #[test]
    fn test_stamped_component_order() {
        let dq = DualQuaternion::from_translation_rotation(
            &Vector3::new(0.0, 0.0, 0.3),
            &UnitQuaternion::from_euler_angles(0.2, 0.0, 0.0),
        );

        let stamped = DualQuaternionStamped::new(0.0, "n", &dq);

        assert_eq!(stamped.wp, dq.primary.w);
        assert_eq!(stamped.xp, dq.primary.i);
        assert_eq!(stamped.zd, dq.dual.k);
        assert_eq!(stamped.dual_quaternion(), dq);
    }

    #[test]
    fn test_channel_telemetry_forwards() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut sink = ChannelTelemetry::new(tx);

        sink.publish(frame(Vector4::new(0.1, -0.1, 0.1, -0.1))).unwrap();

        let received = rx.try_recv().unwrap();
        assert_eq!(received.vertical_command(), Vector4::new(0.1, -0.1, 0.1, -0.1));
        assert_eq!(received.command[0].x, 0.0);
    }

    #[test]
    fn test_channel_telemetry_closed() {
        let (tx, rx) = crossbeam_channel::unbounded();
        drop(rx);
        let mut sink = ChannelTelemetry::new(tx);

        let result = sink.publish(frame(Vector4::zeros()));

        assert!(matches!(result, Err(NodeError::ChannelClosed("telemetry"))));
    }
}
