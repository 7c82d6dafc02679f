//! leveler-node - chassis leveling node
//!
//! Runs the leveling loop against a built-in kinematic chassis model: the
//! per-unit vertical velocity commands are integrated into unit heights,
//! the chassis plane is refit from those heights, and the resulting
//! orientation, ground distance and flipper angles are fed back through
//! the sensor channel.
//!
//! # Usage
//!
//! ```bash
//! # With default config
//! cargo run --release --bin leveler-node
//!
//! # With custom config file
//! cargo run --release --bin leveler-node -- --config chassis-leveler.toml
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use nalgebra::{Matrix3x4, UnitQuaternion, Vector3, Vector4};

use leveler_core::kinematics::{KinematicModel, PINV_EPSILON};
use leveler_core::math::quaternion_to_rpy;
use leveler_core::state::JointSignConvention;
use leveler_core::LevelerError;

use leveler_node::params::StaticParameters;
use leveler_node::sensors::{sensor_channel, SensorMessage, SensorPump, SensorSender};
use leveler_node::telemetry::{ChannelTelemetry, LogTelemetry, Telemetry, TelemetryFrame};
use leveler_node::{ControlService, LoopDriver, NodeConfig, NodeContext, NodeError, ServiceRequest};

// ============================================================================
// Demo chassis
// ============================================================================

/// Initial disturbance of the simulated chassis: roll, pitch [deg], height [m]
const INITIAL_ROLL_DEG: f64 = 10.0;
const INITIAL_PITCH_DEG: f64 = -6.0;
const INITIAL_HEIGHT: f64 = 0.22;

/// Constant heading of the simulated chassis [rad]; the controller ignores it
const HEADING: f64 = 0.7;

/// Flipper angle at zero unit height [rad] and lever arm [m]
const FLIPPER_BASE: f64 = 1.9;
const FLIPPER_ARM: f64 = 0.25;

/// Number of non-flipper joints ahead of the flippers in the joint array
const WHEEL_JOINTS: usize = 4;

/// Chassis described by the vertical position of each flipper unit
///
/// Heights map to (height, roll, pitch) through the least-squares fit of
/// z_i = h + y_i·roll − x_i·pitch, which is the small-angle articulation
/// Jacobian.
struct DemoChassis {
    unit_heights: Vector4<f64>,
    fit: Matrix3x4<f64>,
    joint_signs: JointSignConvention,
}

impl DemoChassis {
    fn new(model: &KinematicModel, joint_signs: JointSignConvention) -> Result<Self, NodeError> {
        let j_art_dagger = *model.j_art_dagger();
        let fit = j_art_dagger
            .pseudo_inverse(PINV_EPSILON)
            .map_err(|e| LevelerError::PseudoInverse(e.to_string()))?;
        let initial = Vector3::new(
            INITIAL_HEIGHT,
            INITIAL_ROLL_DEG.to_radians(),
            INITIAL_PITCH_DEG.to_radians(),
        );

        Ok(Self {
            unit_heights: j_art_dagger * initial,
            fit,
            joint_signs,
        })
    }

    /// (height, roll, pitch)
    fn pose(&self) -> Vector3<f64> {
        self.fit * self.unit_heights
    }

    fn step(&mut self, command: &Vector4<f64>, dt: f64) {
        self.unit_heights += command * dt;
    }

    fn publish(&self, sensors: &SensorSender) -> Result<(), NodeError> {
        let pose = self.pose();
        let orientation = UnitQuaternion::from_euler_angles(pose.y, pose.z, HEADING);

        let mut joints = vec![0.0; WHEEL_JOINTS];
        joints.extend((0..4).map(|i| {
            let angle = FLIPPER_BASE + self.unit_heights[i] / FLIPPER_ARM;
            self.joint_signs.0[i] * angle
        }));

        sensors.send(SensorMessage::Orientation(orientation))?;
        sensors.send(SensorMessage::GroundDistance(Vector3::new(0.0, 0.0, pose.x)))?;
        sensors.send(SensorMessage::JointState(joints))
    }
}

/// Closes the loop: telemetry in, integrated chassis state out
fn spawn_chassis(
    mut chassis: DemoChassis,
    sensors: SensorSender,
    telemetry: Receiver<TelemetryFrame>,
    dt: f64,
    running: Arc<AtomicBool>,
) -> JoinHandle<()> {
    let report_every = ((1.0 / dt).round() as usize).max(1);

    thread::Builder::new()
        .name("demo-chassis".into())
        .spawn(move || {
            if let Err(e) = chassis.publish(&sensors) {
                log::error!("Demo chassis: {}", e);
                return;
            }

            let start = Instant::now();
            let mut trace = LogTelemetry;
            let mut frames = 0usize;
            while running.load(Ordering::Relaxed) {
                let frame = match telemetry.recv_timeout(Duration::from_millis(200)) {
                    Ok(frame) => frame,
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                };

                let command = frame.vertical_command();
                chassis.step(&command, dt);
                trace.publish(frame.clone()).ok();
                if let Err(e) = chassis.publish(&sensors) {
                    log::warn!("Demo chassis: {}", e);
                    break;
                }

                frames += 1;
                if frames % report_every == 0 {
                    let pose = chassis.pose();
                    let error_rpy = quaternion_to_rpy(&UnitQuaternion::from_quaternion(
                        frame.pose_error.dual_quaternion().primary,
                    ));
                    log::info!(
                        "t={:5.1}s h={:.3} roll={:6.2}° pitch={:6.2}° err=({:6.2}°, {:6.2}°) |cmd|={:.4}",
                        start.elapsed().as_secs_f64(),
                        pose.x,
                        pose.y.to_degrees(),
                        pose.z.to_degrees(),
                        error_rpy.x.to_degrees(),
                        error_rpy.y.to_degrees(),
                        command.norm()
                    );
                }
            }
            log::debug!("Demo chassis stopped");
        })
        .expect("Failed to spawn demo chassis thread")
}

// ============================================================================
// Command Line
// ============================================================================

struct Args {
    config_path: Option<String>,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut result = Args { config_path: None };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    result.config_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    result
}

fn print_help() {
    println!("leveler-node - chassis leveling node with a simulated chassis");
    println!();
    println!("USAGE:");
    println!("    leveler-node [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <FILE>     Configuration file (default: chassis-leveler.toml)");
    println!("    -h, --help              Print help information");
    println!();
    println!("CONTROL MODES (initial_mode):");
    println!("    1 - Orientation");
    println!("    2 - Orientation with flipper null-space objective");
    println!("    3 - Articulation (height, roll, pitch)");
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn run(config: &NodeConfig, running: Arc<AtomicBool>) -> Result<(), NodeError> {
    let ctx = NodeContext::from_config(config)?.shared();
    let service = ControlService::new(Arc::clone(&ctx));

    // The simulated chassis drives forward on side 1
    let params = StaticParameters::new();
    params.set(config.node.drive_side_param.as_str(), 1.0);

    let (sensor_tx, sensor_rx) = sensor_channel();
    let pump = SensorPump::spawn(sensor_rx, Arc::clone(&ctx), Arc::clone(&running));

    let (telemetry_tx, telemetry_rx) = crossbeam_channel::unbounded();
    let mut driver = LoopDriver::from_config(
        config,
        Arc::clone(&ctx),
        Arc::new(params),
        ChannelTelemetry::new(telemetry_tx),
    )?;

    log::info!("  Status: {:?}", service.handle(ServiceRequest::GetStatus));
    log::info!("  Control mode: {}", ctx.mode());

    let chassis = DemoChassis::new(driver.law().model(), config.geometry.joint_signs())?;
    let chassis_handle = spawn_chassis(
        chassis,
        sensor_tx,
        telemetry_rx,
        driver.period().as_secs_f64(),
        Arc::clone(&running),
    );

    let result = driver.run(&running);

    // Dropping the driver closes the telemetry channel and stops the chassis
    running.store(false, Ordering::Relaxed);
    drop(driver);
    if chassis_handle.join().is_err() {
        log::error!("Demo chassis thread panicked");
    }
    if pump.join().is_err() {
        log::error!("Sensor pump thread panicked");
    }

    result
}

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {} - {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    let args = parse_args();
    let config = match NodeConfig::load_or_default(args.config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    log::info!("leveler-node starting");
    log::info!("  Node: {}", config.node.name);
    log::info!("  Rate: {:.1} Hz", config.node.rate_hz);
    log::info!("  Drive side parameter: {}", config.node.drive_side_param);

    // Setup signal handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .expect("Error setting Ctrl-C handler");

    if let Err(e) = run(&config, running) {
        log::error!("Node error: {}", e);
        std::process::exit(1);
    }

    log::info!("leveler-node shutdown complete");
}
