//! Control mode selection
//!
//! The active control law is a closed set of variants. Integer codes only
//! exist at the request boundary, where they are validated before the
//! active mode changes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LevelerError;

/// Value reported when a mode change request is rejected
pub const INVALID_MODE: i32 = -1;

/// Chassis control law
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ControlMode {
    /// Roll/pitch regulation only
    #[default]
    Orientation,
    /// Roll/pitch regulation plus flipper joint objective in the null space
    OrientationNullSpace,
    /// Height, roll and pitch regulation
    Articulation,
}

impl ControlMode {
    /// All modes in code order
    pub const ALL: [ControlMode; 3] = [
        ControlMode::Orientation,
        ControlMode::OrientationNullSpace,
        ControlMode::Articulation,
    ];

    /// Integer code used by the control surface (1, 2 or 3)
    pub fn code(self) -> i32 {
        match self {
            ControlMode::Orientation => 1,
            ControlMode::OrientationNullSpace => 2,
            ControlMode::Articulation => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ControlMode::Orientation => "orientation",
            ControlMode::OrientationNullSpace => "orientationNullSpace",
            ControlMode::Articulation => "articulation",
        }
    }
}

impl TryFrom<i32> for ControlMode {
    type Error = LevelerError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        ControlMode::ALL
            .into_iter()
            .find(|m| m.code() == value)
            .ok_or(LevelerError::InvalidControlMode(value))
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Holds the active control mode and validates changes to it
#[derive(Debug, Clone, Default)]
pub struct ModeDispatcher {
    active: ControlMode,
}

impl ModeDispatcher {
    pub fn new(initial: ControlMode) -> Self {
        Self { active: initial }
    }

    /// Currently active mode
    pub fn mode(&self) -> ControlMode {
        self.active
    }

    /// Request a mode change by integer code
    ///
    /// Returns the accepted code, or [`INVALID_MODE`] if `value` is not a
    /// valid mode. A rejected request leaves the active mode unchanged.
    pub fn set_mode(&mut self, value: i32) -> i32 {
        match ControlMode::try_from(value) {
            Ok(mode) => {
                self.active = mode;
                log::info!("Setting control type to: {}", mode);
                mode.code()
            }
            Err(e) => {
                log::error!("Received a bad control type: {}", e);
                INVALID_MODE
            }
        }
    }
}
