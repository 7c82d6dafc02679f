//! Control algorithms for chassis leveling
//!
//! Implements the three switchable control laws:
//! - Orientation: roll/pitch regulation through the orientation Jacobian
//! - Orientation with null space: adds a flipper-joint objective that cannot
//!   disturb the orientation task
//! - Articulation: height, roll and pitch regulation with dual quaternions

pub mod mode;
pub mod setpoint;
pub mod null_space;
pub mod law;

pub use mode::*;
pub use setpoint::*;
pub use null_space::*;
pub use law::*;
