//! Leveler Node
//!
//! Runtime around the chassis leveling controller: shared node state,
//! asynchronous sensor feeds, the runtime control surface and the
//! fixed-rate loop driver.
//!
//! # Architecture
//!
//! ```text
//! sensor feeds ──► SensorPump ──► NodeContext ◄── ControlService (requests)
//!                                     │
//!                                     ▼
//!                   LoopDriver (20 Hz): aggregate → evaluate → TelemetryFrame
//!                                     │
//!                                     ▼
//!                                 Telemetry
//! ```
//!
//! # Components
//!
//! - [`config`]: TOML node configuration
//! - [`context`]: Shared mutable node state
//! - [`status`]: Activation and halt flags
//! - [`service`]: Runtime reconfiguration requests
//! - [`sensors`]: Sensor channel and pump thread
//! - [`params`]: Runtime parameter source
//! - [`telemetry`]: Telemetry frames and sinks
//! - [`driver`]: Fixed-rate loop driver

pub mod config;
pub mod context;
pub mod status;
pub mod service;
pub mod sensors;
pub mod params;
pub mod telemetry;
pub mod driver;
pub mod error;

// Re-exports
pub use config::NodeConfig;
pub use context::{NodeContext, SharedContext};
pub use driver::LoopDriver;
pub use error::NodeError;
pub use service::{ControlService, ServiceRequest, ServiceResponse};
