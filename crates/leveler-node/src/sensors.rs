//! Sensor feeds
//!
//! Orientation, ground distance and joint readings arrive independently on
//! one channel. A pump thread writes each message into the shared context
//! as a whole-record replacement; the loop only ever reads the latest
//! values and never blocks on the channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use nalgebra::{UnitQuaternion, Vector3};

use crate::context::{NodeContext, SharedContext};
use crate::error::NodeError;

/// How long the pump waits for a message before re-checking the stop flag
const PUMP_POLL: Duration = Duration::from_millis(100);

/// One sensor reading
#[derive(Debug, Clone, PartialEq)]
pub enum SensorMessage {
    /// Raw chassis orientation (heading included)
    Orientation(UnitQuaternion<f64>),
    /// Vector to the ground; only z is used
    GroundDistance(Vector3<f64>),
    /// Full joint array; the last four entries are the flipper joints
    JointState(Vec<f64>),
}

impl SensorMessage {
    /// Write the reading into the context
    pub fn apply(self, ctx: &NodeContext) {
        match self {
            SensorMessage::Orientation(q) => ctx.update_orientation(q),
            SensorMessage::GroundDistance(d) => ctx.update_ground_distance(d),
            SensorMessage::JointState(joints) => ctx.update_joint_positions(joints),
        }
    }
}

/// Producer side of the sensor channel
#[derive(Debug, Clone)]
pub struct SensorSender {
    tx: Sender<SensorMessage>,
}

impl SensorSender {
    pub fn send(&self, message: SensorMessage) -> Result<(), NodeError> {
        self.tx.send(message).map_err(|_| NodeError::ChannelClosed("sensors"))
    }
}

/// Create the sensor channel
pub fn sensor_channel() -> (SensorSender, Receiver<SensorMessage>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (SensorSender { tx }, rx)
}

/// Sensor pump thread handle
pub struct SensorPump {
    handle: JoinHandle<()>,
}

impl SensorPump {
    /// Spawn the pump
    ///
    /// Runs until `running` is cleared or every sender has been dropped.
    pub fn spawn(rx: Receiver<SensorMessage>, ctx: SharedContext, running: Arc<AtomicBool>) -> Self {
        let handle = thread::Builder::new()
            .name("sensor-pump".into())
            .spawn(move || run_pump(&rx, &ctx, &running))
            .expect("Failed to spawn sensor pump thread");

        Self { handle }
    }

    /// Wait for the pump to finish
    pub fn join(self) -> thread::Result<()> {
        self.handle.join()
    }
}

fn run_pump(rx: &Receiver<SensorMessage>, ctx: &NodeContext, running: &AtomicBool) {
    while running.load(Ordering::Relaxed) {
        match rx.recv_timeout(PUMP_POLL) {
            Ok(message) => message.apply(ctx),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                log::warn!("Sensor channel closed, pump stopping");
                return;
            }
        }
    }
    log::debug!("Sensor pump stopped");
}
