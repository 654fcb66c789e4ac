//! Core-to-sink event messages.
//!
//! Components report state changes over an asynchronous channel instead of
//! logging directly: the supervisor and dispatcher stay free of I/O
//! concerns, and the daemon decides how events are surfaced.
//!
//! Uses tagged enum serialization:
//! ```json
//! {
//!   "type": "stageSpawned",
//!   "payload": {
//!     "stage": "capture"
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};

/// Events reported by the core to the telemetry sink.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    /// One stage process was spawned.
    StageSpawned { stage: String },

    /// All stages spawned; the pipeline is now running.
    PipelineStarted { stages: Vec<String> },

    /// A start request found the pipeline already running (no-op).
    PipelineAlreadyRunning,

    /// A stage failed to spawn; stages launched during the attempt were
    /// rolled back and the pipeline is idle again.
    StartAborted { stage: String, error: String },

    /// A stage received its termination request and went down cleanly.
    StageTerminated { stage: String },

    /// A stage did not terminate cleanly within the grace period.
    StageTerminationFailed { stage: String, error: String },

    /// Every stage was released; the pipeline is idle again. Stages that
    /// failed to terminate cleanly are listed by name.
    PipelineStopped { failed: Vec<String> },

    /// A stop request found nothing to stop (no-op).
    PipelineIdle,

    /// An inbound payload did not match any recognized command.
    CommandRejected { input: String },

    /// A temperature reading was published to the sensor topic.
    ReadingPublished { celsius: f64 },
}
