//! Process execution seam for pipeline stages.
//!
//! The supervisor spawns and releases stages through these traits so the
//! state machine can be exercised without real child processes. The
//! production adapter lives in [`crate::pipeline::process`]; the scripted
//! in-memory runner below backs the lifecycle tests.

use crate::pipeline::error::{SpawnError, TerminateError};
use aqm_protocol::StageSpec;
use async_trait::async_trait;
use std::collections::HashSet;
use std::io;
use std::os::fd::OwnedFd;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Captured stdout of a running stage, ready to become the next stage's
/// stdin.
///
/// Wraps the raw pipe end so inter-stage wiring happens at the descriptor
/// level: frames flow process-to-process without touching the controller.
#[derive(Debug)]
pub struct StageOutput {
    fd: OwnedFd,
}

impl StageOutput {
    pub(crate) fn new(fd: OwnedFd) -> Self {
        Self { fd }
    }

    pub(crate) fn into_stdio(self) -> Stdio {
        Stdio::from(self.fd)
    }
}

/// An owned, running pipeline stage.
///
/// Handles are owned exclusively by the supervisor; they are created only
/// during a start attempt and released only by stop or rollback.
#[async_trait]
pub trait StageHandle: Send + Sync {
    /// Stage name from the spec that spawned it.
    fn name(&self) -> &str;

    /// Take the captured stdout, if this stage pipes into the next one.
    ///
    /// Yields `Some` at most once.
    fn take_output(&mut self) -> Option<StageOutput>;

    /// Request termination: graceful signal, bounded wait, then force kill.
    async fn shutdown(&mut self, grace: Duration) -> Result<(), TerminateError>;
}

/// Spawns stage processes.
#[async_trait]
pub trait StageRunner: Send + Sync {
    /// Launch `spec`, wiring `input` to its stdin when the spec asks for
    /// piped input.
    async fn spawn(
        &self,
        spec: &StageSpec,
        input: Option<StageOutput>,
    ) -> Result<Box<dyn StageHandle>, SpawnError>;
}

/// Scripted in-memory runner for deterministic tests.
///
/// Spawns no real processes: each stage either "launches" and has its
/// lifecycle recorded, or fails according to the script. Clones share the
/// same recording, so tests keep a handle to inspect what the supervisor
/// did.
#[derive(Clone, Default)]
pub struct ScriptedRunner {
    inner: Arc<ScriptedInner>,
}

#[derive(Default)]
struct ScriptedInner {
    fail_spawn: Mutex<HashSet<String>>,
    fail_shutdown: Mutex<HashSet<String>>,
    spawned: Mutex<Vec<String>>,
    terminated: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a spawn failure for the named stage.
    pub fn fail_spawn_of(self, stage: &str) -> Self {
        self.inner.fail_spawn.lock().unwrap().insert(stage.to_string());
        self
    }

    /// Script a termination failure for the named stage.
    ///
    /// The termination request is still recorded before it fails.
    pub fn fail_shutdown_of(self, stage: &str) -> Self {
        self.inner.fail_shutdown.lock().unwrap().insert(stage.to_string());
        self
    }

    /// Names of every stage spawned so far, in spawn order.
    pub fn spawned(&self) -> Vec<String> {
        self.inner.spawned.lock().unwrap().clone()
    }

    /// Names of every stage that received a termination request.
    pub fn terminated(&self) -> Vec<String> {
        self.inner.terminated.lock().unwrap().clone()
    }
}

#[async_trait]
impl StageRunner for ScriptedRunner {
    async fn spawn(
        &self,
        spec: &StageSpec,
        _input: Option<StageOutput>,
    ) -> Result<Box<dyn StageHandle>, SpawnError> {
        if self.inner.fail_spawn.lock().unwrap().contains(&spec.name) {
            return Err(SpawnError::Launch {
                program: spec.program.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "scripted spawn failure"),
            });
        }
        self.inner.spawned.lock().unwrap().push(spec.name.clone());
        Ok(Box::new(ScriptedStage {
            name: spec.name.clone(),
            inner: Arc::clone(&self.inner),
        }))
    }
}

struct ScriptedStage {
    name: String,
    inner: Arc<ScriptedInner>,
}

#[async_trait]
impl StageHandle for ScriptedStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn take_output(&mut self) -> Option<StageOutput> {
        None
    }

    async fn shutdown(&mut self, _grace: Duration) -> Result<(), TerminateError> {
        self.inner.terminated.lock().unwrap().push(self.name.clone());
        if self.inner.fail_shutdown.lock().unwrap().contains(&self.name) {
            return Err(TerminateError::Signal {
                stage: self.name.clone(),
                reason: "scripted termination failure".to_string(),
            });
        }
        Ok(())
    }
}
