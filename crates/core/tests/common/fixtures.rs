//! Test fixtures: sample configurations and event helpers.

use aqm_core::config::{CameraConfig, StreamSink, VideoConfig};
use aqm_protocol::Event;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Relay-variant video config: capture, transcode, relay-serve.
#[allow(dead_code)]
pub fn relay_video_config() -> VideoConfig {
    VideoConfig {
        camera: CameraConfig::default(),
        sink: StreamSink::Relay {
            config_path: PathBuf::from("/etc/mediamtx.yml"),
            ingest_url: "rtsp://127.0.0.1:8554/aquarium".to_string(),
        },
    }
}

/// UDP-variant video config: capture and transcode only.
#[allow(dead_code)]
pub fn udp_video_config() -> VideoConfig {
    VideoConfig {
        camera: CameraConfig::default(),
        sink: StreamSink::Udp {
            host: "10.0.0.7".to_string(),
            port: 5000,
        },
    }
}

/// Drain every event currently queued on the channel without waiting.
#[allow(dead_code)]
pub fn drain_events(rx: &mut mpsc::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
