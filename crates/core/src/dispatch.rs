//! Command dispatcher.
//!
//! Maps inbound bus payloads onto supervisor operations. The dispatcher
//! holds no pipeline state of its own: it is a pure payload-to-verb
//! mapping plus one side-effecting supervisor call.

use crate::pipeline::{PipelineError, PipelineSupervisor, StartOutcome, StopOutcome};
use aqm_protocol::{Command, Event};
use std::sync::Arc;
use tokio::sync::mpsc::Sender;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Result of dispatching one inbound payload.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// `on`: the start outcome, or the reported spawn failure.
    Start(Result<StartOutcome, PipelineError>),

    /// `off`: the stop outcome.
    Stop(StopOutcome),

    /// Anything else: reported, no state change.
    Unrecognized { input: String },
}

/// Routes recognized commands to the pipeline supervisor.
pub struct CommandDispatcher {
    supervisor: Arc<Mutex<PipelineSupervisor>>,
    events_tx: Sender<Event>,
}

impl CommandDispatcher {
    pub fn new(supervisor: Arc<Mutex<PipelineSupervisor>>, events_tx: Sender<Event>) -> Self {
        Self {
            supervisor,
            events_tx,
        }
    }

    /// Dispatch one payload.
    ///
    /// A recognized verb runs its supervisor operation to completion while
    /// the supervisor lock is held, so concurrent commands cannot
    /// interleave into an inconsistent handle set. Failures are reported
    /// in the outcome and the log; nothing here panics the command loop.
    pub async fn dispatch(&self, payload: &str) -> DispatchOutcome {
        match payload.parse::<Command>() {
            Ok(Command::On) => {
                info!("command received: on");
                let result = self.supervisor.lock().await.start().await;
                if let Err(error) = &result {
                    error!(%error, "pipeline start failed");
                }
                DispatchOutcome::Start(result)
            }
            Ok(Command::Off) => {
                info!("command received: off");
                DispatchOutcome::Stop(self.supervisor.lock().await.stop().await)
            }
            Err(unknown) => {
                warn!(input = %unknown.0, "unrecognized command");
                let _ = self
                    .events_tx
                    .send(Event::CommandRejected {
                        input: unknown.0.clone(),
                    })
                    .await;
                DispatchOutcome::Unrecognized { input: unknown.0 }
            }
        }
    }
}
