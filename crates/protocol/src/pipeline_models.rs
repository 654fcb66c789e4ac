//! Video pipeline data models.
//!
//! The pipeline is an ordered chain of external processes (capture,
//! transcode, and optionally a relay server) treated as a single logical
//! on/off unit by the supervisor.

use serde::{Deserialize, Serialize};

/// Lifecycle state of the video pipeline.
///
/// Exactly one pipeline exists process-wide. The supervisor's stage-handle
/// set is non-empty while `Running` and empty while `Idle`; no intermediate
/// state is observable from outside a start or stop operation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineState {
    /// No stages are running.
    Idle,

    /// Every stage of the chain has been spawned and is tracked.
    Running,
}

/// Where a stage reads its input from.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageInput {
    /// No input stream; stdin is closed.
    Null,

    /// Stdin is wired to the previous stage's stdout.
    ///
    /// The wiring is a direct process-to-process pipe; frames never pass
    /// through the controller or a temporary file.
    Piped,
}

/// Immutable descriptor of one pipeline stage.
///
/// Built fresh by the chain builder on every start and never mutated
/// afterwards.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StageSpec {
    /// Short stage name used in events and logs (`capture`, `transcode`,
    /// `relay-serve`).
    pub name: String,

    /// Executable path or name.
    pub program: String,

    /// Ordered argument list.
    pub args: Vec<String>,

    /// Input wiring for this stage.
    pub input: StageInput,

    /// Whether stdout must be captured to feed the next stage's stdin.
    pub pipe_stdout: bool,
}
