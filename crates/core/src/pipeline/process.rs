//! Production stage runner backed by real child processes.
//!
//! Spawns stages with `tokio::process` and wires stdout to stdin at the
//! file-descriptor level, so inter-stage data is piped directly between
//! processes. Termination is a SIGTERM, a bounded wait, then SIGKILL.
//! Every child is spawned with `kill_on_drop`, so stages cannot outlive
//! the controller even when it goes down without reaching the orderly
//! shutdown path.

use crate::pipeline::error::{SpawnError, TerminateError};
use crate::pipeline::runner::{StageHandle, StageOutput, StageRunner};
use aqm_protocol::{StageInput, StageSpec};
use async_trait::async_trait;
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::warn;

/// Spawns pipeline stages as real child processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    /// Log a warning for every stage whose executable cannot be found.
    ///
    /// Purely advisory at startup; the authoritative failure is the spawn
    /// itself.
    pub fn preflight(specs: &[StageSpec]) {
        for spec in specs {
            if which::which(&spec.program).is_err() {
                warn!(
                    stage = %spec.name,
                    program = %spec.program,
                    "stage executable not found"
                );
            }
        }
    }
}

#[async_trait]
impl StageRunner for ProcessRunner {
    async fn spawn(
        &self,
        spec: &StageSpec,
        input: Option<StageOutput>,
    ) -> Result<Box<dyn StageHandle>, SpawnError> {
        let mut command = Command::new(&spec.program);
        command.args(&spec.args);

        command.stdin(match spec.input {
            StageInput::Null => Stdio::null(),
            StageInput::Piped => {
                let output = input.ok_or_else(|| SpawnError::MissingInput {
                    stage: spec.name.clone(),
                })?;
                output.into_stdio()
            }
        });
        command.stdout(if spec.pipe_stdout {
            Stdio::piped()
        } else {
            Stdio::inherit()
        });
        command.kill_on_drop(true);

        let mut child = command.spawn().map_err(|source| SpawnError::Launch {
            program: spec.program.clone(),
            source,
        })?;

        let output = match child.stdout.take() {
            Some(stdout) => {
                let fd = stdout
                    .into_owned_fd()
                    .map_err(|source| SpawnError::Launch {
                        program: spec.program.clone(),
                        source,
                    })?;
                Some(StageOutput::new(fd))
            }
            None => None,
        };

        Ok(Box::new(ProcessStage {
            name: spec.name.clone(),
            child,
            output,
        }))
    }
}

struct ProcessStage {
    name: String,
    child: Child,
    output: Option<StageOutput>,
}

#[async_trait]
impl StageHandle for ProcessStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn take_output(&mut self) -> Option<StageOutput> {
        self.output.take()
    }

    async fn shutdown(&mut self, grace: Duration) -> Result<(), TerminateError> {
        if self.child.try_wait().ok().flatten().is_some() {
            return Ok(());
        }

        // Close our end of an untaken pipe so downstream readers see EOF.
        self.output.take();

        if let Some(pid) = self.child.id() {
            match kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                // ESRCH: the stage exited between try_wait and kill.
                Ok(()) | Err(Errno::ESRCH) => {}
                Err(errno) => {
                    warn!(stage = %self.name, %errno, "could not deliver SIGTERM");
                }
            }
        }

        match timeout(grace, self.child.wait()).await {
            Ok(Ok(_status)) => Ok(()),
            Ok(Err(source)) => Err(TerminateError::Kill {
                stage: self.name.clone(),
                source,
            }),
            Err(_elapsed) => {
                self.child
                    .kill()
                    .await
                    .map_err(|source| TerminateError::Kill {
                        stage: self.name.clone(),
                        source,
                    })?;
                Err(TerminateError::Forced {
                    stage: self.name.clone(),
                    grace,
                })
            }
        }
    }
}
