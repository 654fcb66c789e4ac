//! Pipeline lifecycle supervisor.
//!
//! Owns the stage-handle set and the Idle/Running state machine. All
//! mutation goes through [`PipelineSupervisor::start`] and
//! [`PipelineSupervisor::stop`]; shared access is serialized by the caller
//! (the runtime wraps the supervisor in an async mutex), so one operation
//! runs to completion before the next is admitted.

use crate::config::VideoConfig;
use crate::pipeline::builder;
use crate::pipeline::error::PipelineError;
use crate::pipeline::runner::{StageHandle, StageRunner};
use aqm_protocol::{Event, PipelineState, StageInput};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tracing::{debug, error, info, warn};

/// Default window a stage gets to exit after the termination signal.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(5);

/// Outcome of a start request.
#[derive(Debug, PartialEq, Eq)]
pub enum StartOutcome {
    /// All stages spawned; the pipeline is now running.
    Started { stages: usize },

    /// The pipeline was already running; nothing was spawned.
    AlreadyRunning,
}

/// Outcome of a stop request.
#[derive(Debug, PartialEq, Eq)]
pub enum StopOutcome {
    /// Termination was requested for every stage; any that did not go
    /// down cleanly are listed by name.
    Stopped { failed: Vec<String> },

    /// The pipeline was already idle; no signals were sent.
    AlreadyIdle,
}

/// Supervises the video pipeline as one logical unit.
///
/// The supervisor is the exclusive owner of all stage handles: they are
/// created only inside [`start`](Self::start) and released only by
/// [`stop`](Self::stop) or the rollback of a failed start. The handle set
/// is non-empty exactly while the state is `Running`.
pub struct PipelineSupervisor {
    runner: Arc<dyn StageRunner>,
    video: VideoConfig,
    grace: Duration,
    state: PipelineState,
    stages: Vec<Box<dyn StageHandle>>,
    events_tx: Sender<Event>,
}

impl PipelineSupervisor {
    pub fn new(runner: Arc<dyn StageRunner>, video: VideoConfig, events_tx: Sender<Event>) -> Self {
        Self {
            runner,
            video,
            grace: DEFAULT_GRACE,
            state: PipelineState::Idle,
            stages: Vec::new(),
            events_tx,
        }
    }

    /// Override the graceful-termination window.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Current pipeline state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Number of stages currently tracked. Non-zero exactly while running.
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Names of the tracked stages in spawn order.
    pub fn stage_names(&self) -> Vec<String> {
        self.stages.iter().map(|stage| stage.name().to_string()).collect()
    }

    /// Start the pipeline.
    ///
    /// Idempotent: a second start while running is a no-op, not an error.
    /// Stages are spawned in declared order, each piped stage wired to its
    /// predecessor's stdout. On a spawn failure every stage launched
    /// during this attempt is terminated before the error is returned, so
    /// a failed start never leaves a partially-running pipeline behind.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Spawn`] naming the stage that failed. The failure
    /// is recoverable: the pipeline is idle again and a later start may
    /// succeed.
    pub async fn start(&mut self) -> Result<StartOutcome, PipelineError> {
        if self.state == PipelineState::Running {
            debug!("start requested but pipeline is already running");
            self.emit(Event::PipelineAlreadyRunning).await;
            return Ok(StartOutcome::AlreadyRunning);
        }

        let specs = builder::build_stages(&self.video);
        let mut spawned: Vec<Box<dyn StageHandle>> = Vec::with_capacity(specs.len());

        for spec in &specs {
            let input = match spec.input {
                StageInput::Piped => spawned.last_mut().and_then(|stage| stage.take_output()),
                StageInput::Null => None,
            };

            match self.runner.spawn(spec, input).await {
                Ok(handle) => {
                    info!(stage = %spec.name, "stage spawned");
                    self.emit(Event::StageSpawned {
                        stage: spec.name.clone(),
                    })
                    .await;
                    spawned.push(handle);
                }
                Err(source) => {
                    error!(stage = %spec.name, %source, "stage failed to spawn, rolling back");
                    self.release(spawned).await;
                    self.emit(Event::StartAborted {
                        stage: spec.name.clone(),
                        error: source.to_string(),
                    })
                    .await;
                    return Err(PipelineError::Spawn {
                        stage: spec.name.clone(),
                        source,
                    });
                }
            }
        }

        let names: Vec<String> = spawned.iter().map(|stage| stage.name().to_string()).collect();
        let count = spawned.len();
        self.stages = spawned;
        self.state = PipelineState::Running;
        info!(stages = count, "pipeline running");
        self.emit(Event::PipelineStarted { stages: names }).await;
        Ok(StartOutcome::Started { stages: count })
    }

    /// Stop the pipeline.
    ///
    /// Idempotent: stopping an idle pipeline sends no signals. Termination
    /// is best-effort: every stage receives a request even when earlier
    /// ones fail, and the pipeline always ends up idle with an empty
    /// handle set. Stages that did not terminate cleanly are reported in
    /// the outcome for the operator.
    pub async fn stop(&mut self) -> StopOutcome {
        if self.state == PipelineState::Idle {
            debug!("stop requested but pipeline is already idle");
            self.emit(Event::PipelineIdle).await;
            return StopOutcome::AlreadyIdle;
        }

        let stages = std::mem::take(&mut self.stages);
        let failed = self.release(stages).await;
        self.state = PipelineState::Idle;
        info!(failed = failed.len(), "pipeline stopped");
        self.emit(Event::PipelineStopped {
            failed: failed.clone(),
        })
        .await;
        StopOutcome::Stopped { failed }
    }

    /// Terminate every stage in `stages`, returning the names that did
    /// not shut down cleanly.
    async fn release(&self, mut stages: Vec<Box<dyn StageHandle>>) -> Vec<String> {
        let mut failed = Vec::new();
        for stage in stages.iter_mut() {
            let name = stage.name().to_string();
            match stage.shutdown(self.grace).await {
                Ok(()) => {
                    self.emit(Event::StageTerminated { stage: name }).await;
                }
                Err(error) => {
                    warn!(stage = %name, %error, "stage did not terminate cleanly");
                    self.emit(Event::StageTerminationFailed {
                        stage: name.clone(),
                        error: error.to_string(),
                    })
                    .await;
                    failed.push(name);
                }
            }
        }
        failed
    }

    async fn emit(&self, event: Event) {
        let _ = self.events_tx.send(event).await;
    }
}
