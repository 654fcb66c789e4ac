//! # aqm-protocol
//!
//! Core protocol definitions and data models for aquamon.
//!
//! This crate defines all shared data structures used for:
//! - Bus command payloads received on the command topic
//! - Video pipeline stage descriptors and lifecycle state
//! - Sensor readings published to the temperature topic
//! - Events reported by the core to the telemetry sink
//!
//! ## Modules
//!
//! - [`command`]: Command verbs carried on the bus
//! - [`pipeline_models`]: Pipeline state and stage descriptors
//! - [`sensor_models`]: Temperature readings
//! - [`events`]: Core-to-sink event messages
//!
//! ## Design Principles
//!
//! - Minimal dependencies: only serde and chrono
//! - Independent compilation: no dependencies on other aquamon crates

pub mod command;
pub mod events;
pub mod pipeline_models;
pub mod sensor_models;

// Re-export all public types for convenience
pub use command::*;
pub use events::*;
pub use pipeline_models::*;
pub use sensor_models::*;
