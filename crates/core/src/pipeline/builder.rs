//! Process chain builder.
//!
//! Turns the static video configuration into the ordered stage list. Pure:
//! the same configuration always yields the same specs, and nothing is
//! spawned here.

use crate::config::{CameraConfig, StreamSink, VideoConfig};
use aqm_protocol::{StageInput, StageSpec};
use std::path::Path;

pub const CAPTURE_STAGE: &str = "capture";
pub const TRANSCODE_STAGE: &str = "transcode";
pub const RELAY_STAGE: &str = "relay-serve";

const CAPTURE_BIN: &str = "/usr/bin/libcamera-vid";
const TRANSCODE_BIN: &str = "/usr/bin/ffmpeg";
const RELAY_BIN: &str = "/usr/bin/mediamtx";

/// Build the ordered stage chain for `video`.
///
/// Capture always feeds the transcoder over a direct pipe. The transcoder
/// pushes either to a remote UDP receiver or to the local relay's ingest
/// URL; the relay variant appends the relay server as a final stage with
/// no stdio wiring.
pub fn build_stages(video: &VideoConfig) -> Vec<StageSpec> {
    let mut stages = vec![
        capture_stage(&video.camera),
        transcode_stage(&video.sink),
    ];
    if let StreamSink::Relay { config_path, .. } = &video.sink {
        stages.push(relay_stage(config_path));
    }
    stages
}

/// Camera capture: raw H.264 to stdout, no preview, runs until signalled.
fn capture_stage(camera: &CameraConfig) -> StageSpec {
    let mut args: Vec<String> = vec![
        "-t".into(),
        "0".into(),
        "--width".into(),
        camera.width.to_string(),
        "--height".into(),
        camera.height.to_string(),
        "--mode".into(),
        camera.sensor_mode.clone(),
        "--inline".into(),
        "--framerate".into(),
        camera.framerate.to_string(),
        "-b".into(),
        camera.bitrate.to_string(),
    ];
    if camera.vflip {
        args.push("--vflip".into());
    }
    if camera.hflip {
        args.push("--hflip".into());
    }
    args.extend(["--flush".into(), "--nopreview".into(), "-o".into(), "-".into()]);

    StageSpec {
        name: CAPTURE_STAGE.to_string(),
        program: CAPTURE_BIN.to_string(),
        args,
        input: StageInput::Null,
        pipe_stdout: true,
    }
}

/// Stream-copy remux from raw H.264 into the configured sink.
///
/// The fifo muxer keeps the pipe drained when the sink stalls: packets are
/// dropped on overflow and delivery is retried instead of backpressuring
/// the capture stage.
fn transcode_stage(sink: &StreamSink) -> StageSpec {
    let (fifo_format, destination) = match sink {
        StreamSink::Udp { host, port } => ("mpegts".to_string(), format!("udp://{host}:{port}")),
        StreamSink::Relay { ingest_url, .. } => ("rtsp".to_string(), ingest_url.clone()),
    };

    let mut args: Vec<String> = [
        "-f", "h264", "-thread_queue_size", "4096", "-vsync", "drop", "-i", "-",
        "-vcodec", "copy", "-f", "fifo",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    args.extend(["-fifo_format".into(), fifo_format]);
    args.extend(
        ["-map", "0:v", "-drop_pkts_on_overflow", "1", "-attempt_recovery", "1", "-recovery_wait_time", "1"]
            .iter()
            .map(|s| s.to_string()),
    );
    args.push(destination);
    args.extend(["-loglevel".into(), "error".into(), "-stats".into()]);

    StageSpec {
        name: TRANSCODE_STAGE.to_string(),
        program: TRANSCODE_BIN.to_string(),
        args,
        input: StageInput::Piped,
        pipe_stdout: false,
    }
}

/// Local relay server re-exposing the ingest stream for viewers.
fn relay_stage(config_path: &Path) -> StageSpec {
    StageSpec {
        name: RELAY_STAGE.to_string(),
        program: RELAY_BIN.to_string(),
        args: vec![config_path.display().to_string()],
        input: StageInput::Null,
        pipe_stdout: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn udp_config() -> VideoConfig {
        VideoConfig {
            camera: CameraConfig::default(),
            sink: StreamSink::Udp {
                host: "10.0.0.7".to_string(),
                port: 5000,
            },
        }
    }

    fn relay_config() -> VideoConfig {
        VideoConfig {
            camera: CameraConfig::default(),
            sink: StreamSink::Relay {
                config_path: PathBuf::from("/etc/mediamtx.yml"),
                ingest_url: "rtsp://127.0.0.1:8554/aquarium".to_string(),
            },
        }
    }

    #[test]
    fn test_udp_variant_has_two_stages_in_order() {
        let stages = build_stages(&udp_config());

        assert_eq!(stages.len(), 2);
        assert_eq!(stages[0].name, CAPTURE_STAGE);
        assert_eq!(stages[1].name, TRANSCODE_STAGE);
    }

    #[test]
    fn test_relay_variant_appends_relay_stage() {
        let stages = build_stages(&relay_config());

        assert_eq!(stages.len(), 3);
        assert_eq!(stages[2].name, RELAY_STAGE);
        assert_eq!(stages[2].input, StageInput::Null);
        assert!(!stages[2].pipe_stdout);
        assert_eq!(stages[2].args, vec!["/etc/mediamtx.yml".to_string()]);
    }

    #[test]
    fn test_capture_pipes_into_transcode() {
        let stages = build_stages(&udp_config());

        assert_eq!(stages[0].input, StageInput::Null);
        assert!(stages[0].pipe_stdout);
        assert_eq!(stages[1].input, StageInput::Piped);
        assert!(!stages[1].pipe_stdout);
    }

    #[test]
    fn test_udp_sink_address() {
        let stages = build_stages(&udp_config());
        assert!(stages[1].args.contains(&"udp://10.0.0.7:5000".to_string()));
        assert!(stages[1].args.contains(&"mpegts".to_string()));
    }

    #[test]
    fn test_relay_sink_ingest_url() {
        let stages = build_stages(&relay_config());
        assert!(stages[1]
            .args
            .contains(&"rtsp://127.0.0.1:8554/aquarium".to_string()));
    }

    #[test]
    fn test_camera_parameters_flow_into_capture_args() {
        let mut config = udp_config();
        config.camera.width = 1280;
        config.camera.height = 720;
        config.camera.framerate = 25;
        config.camera.vflip = false;
        config.camera.hflip = false;

        let args = &build_stages(&config)[0].args;
        assert!(args.windows(2).any(|w| w == ["--width", "1280"]));
        assert!(args.windows(2).any(|w| w == ["--height", "720"]));
        assert!(args.windows(2).any(|w| w == ["--framerate", "25"]));
        assert!(!args.contains(&"--vflip".to_string()));
        assert!(!args.contains(&"--hflip".to_string()));
    }

    #[test]
    fn test_builder_is_deterministic() {
        let config = relay_config();
        assert_eq!(build_stages(&config), build_stages(&config));
    }
}
