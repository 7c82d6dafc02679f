//! Node configuration
//!
//! Static configuration read once at startup from a TOML file. Every section
//! has defaults, so an empty file (or no file) yields a working node.

use std::fs;
use std::path::Path;
use std::time::Duration;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use leveler_core::control::{ControlMode, NullSpaceGoal, PoseGains, PoseSetpoint};
use leveler_core::kinematics::MountingGeometry;
use leveler_core::state::JointSignConvention;
use leveler_core::{LevelerError, NUM_UNITS};

use crate::error::NodeError;

/// Default configuration file locations, tried in order
pub const DEFAULT_CONFIG_PATHS: [&str; 2] = ["chassis-leveler.toml", "/etc/chassis-leveler.toml"];

/// Main node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Loop and runtime settings
    pub node: LoopConfig,
    /// Initial pose setpoint
    pub setpoint: SetpointConfig,
    /// Initial proportional gains
    pub gains: GainsConfig,
    /// Flipper joint objective for the null-space mode
    pub null_space: NullSpaceConfig,
    /// Flipper mounting geometry
    pub geometry: GeometryConfig,
    /// Initial control mode code (1, 2 or 3)
    pub initial_mode: i32,
}

/// Loop and runtime settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Node name, used as telemetry frame id
    pub name: String,
    /// Control loop rate [Hz]
    pub rate_hz: f64,
    /// Whether the node starts active
    pub start_active: bool,
    /// Path of the chassis heading-polarity parameter
    pub drive_side_param: String,
    /// Give up waiting for the parameter after this long [s]
    pub param_wait_timeout_s: f64,
    /// First retry delay while waiting for the parameter [ms]
    pub param_wait_initial_backoff_ms: u64,
    /// Retry delay cap while waiting for the parameter [ms]
    pub param_wait_max_backoff_ms: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            name: "chassis_control".to_string(),
            rate_hz: 20.0,
            start_active: true,
            drive_side_param: "/rosi/forward_side".to_string(),
            param_wait_timeout_s: 10.0,
            param_wait_initial_backoff_ms: 50,
            param_wait_max_backoff_ms: 1000,
        }
    }
}

impl LoopConfig {
    /// Reject values that have no valid period or timeout
    pub fn validate(&self) -> Result<(), NodeError> {
        if !(self.rate_hz.is_finite() && self.rate_hz > 0.0) {
            return Err(NodeError::InvalidConfig(format!(
                "node.rate_hz must be positive, got {}",
                self.rate_hz
            )));
        }
        if !(self.param_wait_timeout_s.is_finite() && self.param_wait_timeout_s >= 0.0) {
            return Err(NodeError::InvalidConfig(format!(
                "node.param_wait_timeout_s must be non-negative, got {}",
                self.param_wait_timeout_s
            )));
        }
        Ok(())
    }

    /// Loop period; call [`LoopConfig::validate`] first
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.rate_hz)
    }

    pub fn param_wait_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.param_wait_timeout_s)
    }
}

/// Pose setpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SetpointConfig {
    /// Translation [m]; only z (ground distance) matters to the controller
    pub translation: [f64; 3],
    /// Roll-pitch-yaw [deg]
    pub orientation_rpy_deg: [f64; 3],
}

impl Default for SetpointConfig {
    fn default() -> Self {
        Self {
            translation: [0.0, 0.0, 0.3],
            orientation_rpy_deg: [0.0, 0.0, 0.0],
        }
    }
}

impl SetpointConfig {
    pub fn to_setpoint(&self) -> PoseSetpoint {
        let rpy = Vector3::from(self.orientation_rpy_deg.map(f64::to_radians));
        PoseSetpoint::new(&Vector3::from(self.translation), &rpy)
    }
}

/// Proportional gains configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GainsConfig {
    /// Orientation gain per axis (roll, pitch, yaw)
    pub orientation: [f64; 3],
    /// Translation gain per axis (x, y, z)
    pub translation: [f64; 3],
}

impl Default for GainsConfig {
    fn default() -> Self {
        Self {
            orientation: [2.0, 4.0, 1.0],
            translation: [1.0, 1.0, 0.8],
        }
    }
}

impl GainsConfig {
    pub fn to_gains(&self) -> PoseGains {
        PoseGains::new(&Vector3::from(self.orientation), &Vector3::from(self.translation))
    }
}

/// Null-space objective configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NullSpaceConfig {
    /// Target flipper joint angle per unit [deg]
    pub joint_targets_deg: [f64; NUM_UNITS],
    /// Gain per unit
    pub gains: [f64; NUM_UNITS],
}

impl Default for NullSpaceConfig {
    fn default() -> Self {
        Self {
            joint_targets_deg: [110.0; NUM_UNITS],
            gains: [0.3; NUM_UNITS],
        }
    }
}

impl NullSpaceConfig {
    pub fn to_goal(&self) -> NullSpaceGoal {
        NullSpaceGoal::new(self.joint_targets_deg.map(f64::to_radians), self.gains)
    }
}

/// Flipper mounting geometry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Mount offsets in the chassis frame [m], ordered FL, FR, RL, RR
    pub mounts: [[f64; 3]; NUM_UNITS],
    /// Sign applied to each flipper joint reading
    pub joint_sign: [f64; NUM_UNITS],
}

impl Default for GeometryConfig {
    fn default() -> Self {
        let geometry = MountingGeometry::default();
        Self {
            mounts: geometry.mounts.map(|m| [m.x, m.y, m.z]),
            joint_sign: JointSignConvention::default().0,
        }
    }
}

impl GeometryConfig {
    pub fn to_geometry(&self) -> MountingGeometry {
        MountingGeometry::new(self.mounts.map(|m| Vector3::new(m[0], m[1], m[2])))
    }

    pub fn joint_signs(&self) -> JointSignConvention {
        JointSignConvention(self.joint_sign)
    }
}

impl NodeConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| NodeError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml(&contents).map_err(|source| NodeError::ConfigParse {
            path: path.display().to_string(),
            source,
        })?;
        config.node.validate()?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Load from `path`, or from the default locations if `path` is `None`
    ///
    /// An explicit path that cannot be read or parsed is an error. Missing
    /// default files fall back to built-in defaults.
    pub fn load_or_default(path: Option<&str>) -> Result<Self, NodeError> {
        if let Some(path) = path {
            let config = Self::load(path)?;
            log::info!("Loaded config from {}", path);
            return Ok(config);
        }

        for path in DEFAULT_CONFIG_PATHS {
            if Path::new(path).exists() {
                let config = Self::load(path)?;
                log::info!("Loaded config from {}", path);
                return Ok(config);
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Initial control mode
    pub fn initial_mode(&self) -> Result<ControlMode, LevelerError> {
        ControlMode::try_from(self.initial_mode)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node: LoopConfig::default(),
            setpoint: SetpointConfig::default(),
            gains: GainsConfig::default(),
            null_space: NullSpaceConfig::default(),
            geometry: GeometryConfig::default(),
            initial_mode: ControlMode::default().code(),
        }
    }
}
