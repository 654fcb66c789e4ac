//! Configuration loading and management.
//!
//! All deployment settings come from environment variables; there is no
//! file or flag surface. Loading happens once at startup and the resulting
//! [`AppConfig`] is read-only afterwards.

pub mod error;
pub mod loader;
pub mod models;

pub use error::{ConfigError, ConfigResult};
pub use loader::load_from_env;
pub use models::{
    AppConfig, BrokerConfig, CameraConfig, SensorConfig, StreamSink, TopicsConfig, VideoConfig,
};
