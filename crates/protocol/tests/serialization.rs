use aqm_protocol::*;
use serde_json;

#[test]
fn test_command_serialization() {
    let json = serde_json::to_value(Command::On).expect("Failed to serialize Command");
    assert_eq!(json, "on");

    let deserialized: Command = serde_json::from_value(json).expect("Failed to deserialize Command");
    assert_eq!(deserialized, Command::On);
}

#[test]
fn test_pipeline_state_serialization() {
    let state = PipelineState::Idle;
    let json = serde_json::to_value(state).expect("Failed to serialize PipelineState");

    assert_eq!(json, "IDLE");

    let deserialized: PipelineState =
        serde_json::from_value(json).expect("Failed to deserialize PipelineState");
    assert_eq!(deserialized, PipelineState::Idle);
}

#[test]
fn test_stage_spec_serialization() {
    let spec = StageSpec {
        name: "capture".to_string(),
        program: "/usr/bin/libcamera-vid".to_string(),
        args: vec!["-t".to_string(), "0".to_string(), "-o".to_string(), "-".to_string()],
        input: StageInput::Null,
        pipe_stdout: true,
    };

    let json = serde_json::to_string(&spec).expect("Failed to serialize StageSpec");
    let deserialized: StageSpec = serde_json::from_str(&json).expect("Failed to deserialize StageSpec");

    assert_eq!(deserialized.name, spec.name);
    assert_eq!(deserialized.program, spec.program);
    assert_eq!(deserialized.args, spec.args);
    assert_eq!(deserialized.input, StageInput::Null);
    assert!(deserialized.pipe_stdout);
}

#[test]
fn test_stage_input_serialization() {
    assert_eq!(
        serde_json::to_value(StageInput::Piped).expect("Failed to serialize StageInput"),
        "PIPED"
    );
    assert_eq!(
        serde_json::to_value(StageInput::Null).expect("Failed to serialize StageInput"),
        "NULL"
    );
}

#[test]
fn test_event_enum_serialization() {
    let event = Event::StageSpawned {
        stage: "transcode".to_string(),
    };

    let json = serde_json::to_value(&event).expect("Failed to serialize Event");
    assert_eq!(json["type"], "stageSpawned");
    assert!(json["payload"].is_object());

    let stopped = Event::PipelineStopped {
        failed: vec!["transcode".to_string()],
    };
    let json = serde_json::to_value(&stopped).expect("Failed to serialize Event");
    assert_eq!(json["type"], "pipelineStopped");
    assert_eq!(json["payload"]["failed"][0], "transcode");

    let rejected = Event::CommandRejected {
        input: "toggle".to_string(),
    };
    let json = serde_json::to_value(&rejected).expect("Failed to serialize Event");
    assert_eq!(json["type"], "commandRejected");

    let deserialized: Event = serde_json::from_value(json).expect("Failed to deserialize Event");
    match deserialized {
        Event::CommandRejected { input } => assert_eq!(input, "toggle"),
        _ => panic!("Wrong variant"),
    }
}

#[test]
fn test_unit_variant_event_serialization() {
    let json = serde_json::to_value(Event::PipelineAlreadyRunning)
        .expect("Failed to serialize Event::PipelineAlreadyRunning");
    assert_eq!(json["type"], "pipelineAlreadyRunning");
}

#[test]
fn test_reading_serialization() {
    let reading = Reading {
        celsius: 23.812,
        retries: 1,
        read_at: chrono::Utc::now(),
    };

    let json = serde_json::to_string(&reading).expect("Failed to serialize Reading");
    let deserialized: Reading = serde_json::from_str(&json).expect("Failed to deserialize Reading");

    assert_eq!(deserialized.celsius, reading.celsius);
    assert_eq!(deserialized.retries, reading.retries);
    assert_eq!(deserialized.read_at, reading.read_at);
    assert_eq!(deserialized.payload(), "23.812");
}
