//! Environment-based configuration loader.
//!
//! Required variables are collected in one pass so the startup diagnostic
//! names every missing setting at once. Optional variables fall back to
//! deployment defaults.

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::models::{
    AppConfig, BrokerConfig, CameraConfig, SensorConfig, StreamSink, TopicsConfig, VideoConfig,
};
use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_CLIENT_ID: &str = "aquamond";
const DEFAULT_RELAY_INGEST_URL: &str = "rtsp://127.0.0.1:8554/aquarium";

/// Load the full application configuration from the environment.
///
/// # Errors
///
/// Returns `ConfigError::MissingVars` naming every unset required
/// variable, `ConfigError::InvalidVar` for unparseable values, and
/// `ConfigError::NoSink` when neither stream sink variant is configured.
pub fn load_from_env() -> ConfigResult<AppConfig> {
    let mut missing = Vec::new();

    let host = require(&mut missing, "MQTT_SERVER_IP");
    let port = require(&mut missing, "MQTT_SERVER_PORT");
    let username = require(&mut missing, "MQTT_USERNAME");
    let password = require(&mut missing, "MQTT_PASSWORD");
    let temperature = require(&mut missing, "MQTT_TOPIC_TEMPERATURE");
    let command = require(&mut missing, "MQTT_TOPIC_WEBCAM");

    if !missing.is_empty() {
        return Err(ConfigError::MissingVars { names: missing });
    }

    let broker = BrokerConfig {
        host,
        port: parse("MQTT_SERVER_PORT", &port)?,
        username,
        password,
        client_id: env::var("MQTT_CLIENT_ID").unwrap_or_else(|_| DEFAULT_CLIENT_ID.to_string()),
    };

    let video = VideoConfig {
        camera: load_camera()?,
        sink: load_sink()?,
    };

    let mut sensor = SensorConfig::default();
    if let Ok(base_dir) = env::var("W1_BASE_DIR") {
        sensor.base_dir = base_dir.into();
    }
    if let Some(secs) = optional::<u64>("SENSOR_INTERVAL_SECS")? {
        sensor.publish_interval = Duration::from_secs(secs);
    }

    Ok(AppConfig {
        broker,
        topics: TopicsConfig {
            command,
            temperature,
        },
        video,
        sensor,
    })
}

/// Resolve the stream sink variant.
///
/// A relay config path selects the relay variant; otherwise both receiver
/// variables select UDP push. Setting only one receiver variable is
/// reported as a missing-variable error rather than falling back.
fn load_sink() -> ConfigResult<StreamSink> {
    if let Ok(config_path) = env::var("RELAY_CONFIG_PATH") {
        let ingest_url = env::var("RELAY_INGEST_URL")
            .unwrap_or_else(|_| DEFAULT_RELAY_INGEST_URL.to_string());
        return Ok(StreamSink::Relay {
            config_path: config_path.into(),
            ingest_url,
        });
    }

    match (
        env::var("WEBCAM_RECEIVER_IP"),
        env::var("WEBCAM_RECEIVER_PORT"),
    ) {
        (Ok(host), Ok(port)) => Ok(StreamSink::Udp {
            host,
            port: parse("WEBCAM_RECEIVER_PORT", &port)?,
        }),
        (Ok(_), Err(_)) => Err(ConfigError::MissingVars {
            names: vec!["WEBCAM_RECEIVER_PORT".to_string()],
        }),
        (Err(_), Ok(_)) => Err(ConfigError::MissingVars {
            names: vec!["WEBCAM_RECEIVER_IP".to_string()],
        }),
        (Err(_), Err(_)) => Err(ConfigError::NoSink),
    }
}

fn load_camera() -> ConfigResult<CameraConfig> {
    let mut camera = CameraConfig::default();
    if let Some(width) = optional("CAMERA_WIDTH")? {
        camera.width = width;
    }
    if let Some(height) = optional("CAMERA_HEIGHT")? {
        camera.height = height;
    }
    if let Some(framerate) = optional("CAMERA_FRAMERATE")? {
        camera.framerate = framerate;
    }
    if let Some(bitrate) = optional("CAMERA_BITRATE")? {
        camera.bitrate = bitrate;
    }
    Ok(camera)
}

/// Read a required variable, recording its name when unset.
fn require(missing: &mut Vec<String>, name: &str) -> String {
    match env::var(name) {
        Ok(value) => value,
        Err(_) => {
            missing.push(name.to_string());
            String::new()
        }
    }
}

/// Parse a variable value that is already known to be set.
fn parse<T: FromStr>(name: &str, value: &str) -> ConfigResult<T> {
    value.parse().map_err(|_| ConfigError::InvalidVar {
        name: name.to_string(),
        reason: format!("cannot parse {value:?}"),
    })
}

/// Read and parse an optional variable.
fn optional<T: FromStr>(name: &str) -> ConfigResult<Option<T>> {
    match env::var(name) {
        Ok(value) => parse(name, &value).map(Some),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::{Mutex, MutexGuard};

    /// Tests mutate process-global environment state; serialize them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ALL_VARS: &[&str] = &[
        "MQTT_SERVER_IP",
        "MQTT_SERVER_PORT",
        "MQTT_USERNAME",
        "MQTT_PASSWORD",
        "MQTT_TOPIC_TEMPERATURE",
        "MQTT_TOPIC_WEBCAM",
        "MQTT_CLIENT_ID",
        "WEBCAM_RECEIVER_IP",
        "WEBCAM_RECEIVER_PORT",
        "RELAY_CONFIG_PATH",
        "RELAY_INGEST_URL",
        "W1_BASE_DIR",
        "SENSOR_INTERVAL_SECS",
        "CAMERA_WIDTH",
        "CAMERA_HEIGHT",
        "CAMERA_FRAMERATE",
        "CAMERA_BITRATE",
    ];

    fn clean_env() -> MutexGuard<'static, ()> {
        let guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        for name in ALL_VARS {
            env::remove_var(name);
        }
        guard
    }

    fn set_required_broker_vars() {
        env::set_var("MQTT_SERVER_IP", "broker.local");
        env::set_var("MQTT_SERVER_PORT", "1883");
        env::set_var("MQTT_USERNAME", "aquarium");
        env::set_var("MQTT_PASSWORD", "secret");
        env::set_var("MQTT_TOPIC_TEMPERATURE", "aquarium/temperature");
        env::set_var("MQTT_TOPIC_WEBCAM", "aquarium/webcam");
    }

    #[test]
    fn test_load_udp_variant() {
        let _guard = clean_env();
        set_required_broker_vars();
        env::set_var("WEBCAM_RECEIVER_IP", "10.0.0.7");
        env::set_var("WEBCAM_RECEIVER_PORT", "5000");

        let config = load_from_env().expect("Should load UDP config");

        assert_eq!(config.broker.host, "broker.local");
        assert_eq!(config.broker.port, 1883);
        assert_eq!(config.broker.client_id, DEFAULT_CLIENT_ID);
        assert_eq!(config.topics.command, "aquarium/webcam");
        assert_eq!(config.topics.temperature, "aquarium/temperature");
        assert_eq!(
            config.video.sink,
            StreamSink::Udp {
                host: "10.0.0.7".to_string(),
                port: 5000,
            }
        );
        assert_eq!(config.sensor.publish_interval, Duration::from_secs(100));
    }

    #[test]
    fn test_load_relay_variant_with_overrides() {
        let _guard = clean_env();
        set_required_broker_vars();
        env::set_var("RELAY_CONFIG_PATH", "/etc/mediamtx.yml");
        env::set_var("MQTT_CLIENT_ID", "tank-two");
        env::set_var("SENSOR_INTERVAL_SECS", "30");
        env::set_var("CAMERA_WIDTH", "1280");
        env::set_var("CAMERA_HEIGHT", "720");

        let config = load_from_env().expect("Should load relay config");

        assert_eq!(config.broker.client_id, "tank-two");
        assert_eq!(config.sensor.publish_interval, Duration::from_secs(30));
        assert_eq!(config.video.camera.width, 1280);
        assert_eq!(config.video.camera.height, 720);
        match config.video.sink {
            StreamSink::Relay {
                config_path,
                ingest_url,
            } => {
                assert_eq!(config_path, PathBuf::from("/etc/mediamtx.yml"));
                assert_eq!(ingest_url, DEFAULT_RELAY_INGEST_URL);
            }
            other => panic!("Expected relay sink, got {other:?}"),
        }
    }

    #[test]
    fn test_relay_takes_precedence_over_udp() {
        let _guard = clean_env();
        set_required_broker_vars();
        env::set_var("RELAY_CONFIG_PATH", "/etc/mediamtx.yml");
        env::set_var("WEBCAM_RECEIVER_IP", "10.0.0.7");
        env::set_var("WEBCAM_RECEIVER_PORT", "5000");

        let config = load_from_env().expect("Should load config");
        assert!(matches!(config.video.sink, StreamSink::Relay { .. }));
    }

    #[test]
    fn test_missing_vars_are_collected() {
        let _guard = clean_env();
        env::set_var("MQTT_SERVER_IP", "broker.local");

        let err = load_from_env().expect_err("Should fail without required vars");
        match err {
            ConfigError::MissingVars { names } => {
                assert!(names.contains(&"MQTT_SERVER_PORT".to_string()));
                assert!(names.contains(&"MQTT_USERNAME".to_string()));
                assert!(names.contains(&"MQTT_PASSWORD".to_string()));
                assert!(names.contains(&"MQTT_TOPIC_TEMPERATURE".to_string()));
                assert!(names.contains(&"MQTT_TOPIC_WEBCAM".to_string()));
                assert!(!names.contains(&"MQTT_SERVER_IP".to_string()));
            }
            other => panic!("Expected MissingVars, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_broker_port() {
        let _guard = clean_env();
        set_required_broker_vars();
        env::set_var("MQTT_SERVER_PORT", "not-a-port");
        env::set_var("WEBCAM_RECEIVER_IP", "10.0.0.7");
        env::set_var("WEBCAM_RECEIVER_PORT", "5000");

        let err = load_from_env().expect_err("Should fail on invalid port");
        assert!(matches!(err, ConfigError::InvalidVar { ref name, .. } if name == "MQTT_SERVER_PORT"));
    }

    #[test]
    fn test_no_sink_configured() {
        let _guard = clean_env();
        set_required_broker_vars();

        let err = load_from_env().expect_err("Should fail without a sink");
        assert!(matches!(err, ConfigError::NoSink));
    }

    #[test]
    fn test_partial_udp_receiver_is_reported() {
        let _guard = clean_env();
        set_required_broker_vars();
        env::set_var("WEBCAM_RECEIVER_IP", "10.0.0.7");

        let err = load_from_env().expect_err("Should fail with half a receiver");
        assert!(matches!(
            err,
            ConfigError::MissingVars { ref names } if names == &["WEBCAM_RECEIVER_PORT".to_string()]
        ));
    }
}
