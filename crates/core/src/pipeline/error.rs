//! Error types for pipeline supervision.

use std::time::Duration;
use thiserror::Error;

/// A stage process could not be launched.
#[derive(Error, Debug)]
pub enum SpawnError {
    /// The executable could not be started.
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        source: std::io::Error,
    },

    /// The stage wants the previous stage's output, but none was available.
    #[error("stage {stage} expects piped input but the previous stage produced none")]
    MissingInput { stage: String },
}

/// A stage did not shut down cleanly.
///
/// Termination failures are degraded, not fatal: the supervisor reports
/// them and still releases the rest of the pipeline.
#[derive(Error, Debug)]
pub enum TerminateError {
    /// The termination signal could not be delivered.
    #[error("failed to signal {stage}: {reason}")]
    Signal { stage: String, reason: String },

    /// The stage ignored the graceful signal and was force-killed.
    #[error("{stage} ignored the termination signal and was killed after {grace:?}")]
    Forced { stage: String, grace: Duration },

    /// Even the force kill failed.
    #[error("failed to kill {stage}: {source}")]
    Kill {
        stage: String,
        source: std::io::Error,
    },
}

/// Top-level pipeline operation failures.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A start attempt failed. Stages launched during the attempt were
    /// already terminated and the pipeline is idle again; a later start
    /// may succeed.
    #[error("pipeline start aborted at stage {stage}: {source}")]
    Spawn {
        stage: String,
        #[source]
        source: SpawnError,
    },
}
