//! Configuration models.
//!
//! The unified [`AppConfig`] aggregates broker, topic, video pipeline, and
//! sensor settings. It is built once by [`crate::config::load_from_env`]
//! and shared read-only afterwards.

use std::path::PathBuf;
use std::time::Duration;

/// MQTT broker connection settings.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Client identifier presented to the broker.
    pub client_id: String,
}

/// Topic names for the two bus channels.
#[derive(Debug, Clone)]
pub struct TopicsConfig {
    /// Inbound command topic (`on`/`off` payloads).
    pub command: String,
    /// Outbound temperature topic (retained readings).
    pub temperature: String,
}

/// Camera capture parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraConfig {
    pub width: u32,
    pub height: u32,
    /// Sensor readout mode, passed through to the capture binary.
    pub sensor_mode: String,
    pub framerate: u32,
    /// Target bitrate in bits per second.
    pub bitrate: u32,
    pub vflip: bool,
    pub hflip: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            sensor_mode: "2304:1296".to_string(),
            framerate: 30,
            bitrate: 3_000_000,
            vflip: true,
            hflip: true,
        }
    }
}

/// Where the transcoder delivers the stream.
///
/// The two deployment variants differ only here: either the transcoder
/// pushes straight to a remote receiver, or it feeds a local relay server
/// that re-exposes the stream and runs as a third pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamSink {
    /// Push MPEG-TS over UDP to a remote receiver.
    Udp { host: String, port: u16 },

    /// Feed a local relay server's ingest point.
    Relay {
        /// Config file handed to the relay server process.
        config_path: PathBuf,
        /// Ingest URL the transcoder publishes to.
        ingest_url: String,
    },
}

/// Static video pipeline configuration, read-only after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoConfig {
    pub camera: CameraConfig,
    pub sink: StreamSink,
}

/// One-wire sensor settings.
#[derive(Debug, Clone)]
pub struct SensorConfig {
    /// Root directory scanned for `28*` device folders.
    pub base_dir: PathBuf,
    /// Interval between published readings.
    pub publish_interval: Duration,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("/sys/bus/w1/devices"),
            publish_interval: Duration::from_secs(100),
        }
    }
}

/// Unified application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub broker: BrokerConfig,
    pub topics: TopicsConfig,
    pub video: VideoConfig,
    pub sensor: SensorConfig,
}
