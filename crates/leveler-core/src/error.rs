//! Error types for the leveling core

use thiserror::Error;

/// Leveling core errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LevelerError {
    /// A mounting offset has a NaN or infinite coordinate
    #[error("Mounting offset of unit {unit} is not finite")]
    NonFiniteGeometry { unit: usize },
    /// The mounting geometry gives the controller no orientation authority
    #[error("Degenerate mounting geometry: orientation Jacobian has rank {rank}")]
    DegenerateGeometry { rank: usize },
    /// Pseudo-inverse computation failed
    #[error("Pseudo-inverse failed: {0}")]
    PseudoInverse(String),
    /// Requested control mode is outside the valid set
    #[error("Invalid control mode: {0}")]
    InvalidControlMode(i32),
}
