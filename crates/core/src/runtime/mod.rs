//! Controller runtime.
//!
//! Wires the collaborators together and owns the shutdown path: one task
//! drives the bus event loop, one publishes sensor readings on a fixed
//! interval, one drains core events into the log, and the main task waits
//! for a termination signal before releasing the pipeline.

use crate::bus::{self, BusClient};
use crate::config::AppConfig;
use crate::dispatch::CommandDispatcher;
use crate::pipeline::{builder, PipelineSupervisor, ProcessRunner, StopOutcome};
use crate::sensor::{Thermometer, W1Device};
use anyhow::{Context, Result};
use aqm_protocol::Event;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Run the controller until a termination signal arrives.
///
/// # Errors
///
/// Returns early only on fatal startup failures: an absent temperature
/// sensor. Everything after startup is contained and reported; command
/// and sensor faults never take the runtime down.
pub async fn run(config: AppConfig) -> Result<()> {
    // The sensor is required hardware: probe it before touching the
    // network.
    W1Device::load_kernel_modules().await;
    let device = W1Device::discover(&config.sensor.base_dir)
        .context("temperature sensor probe failed")?;
    info!(slave = %device.slave_path().display(), "one-wire sensor found");

    let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

    ProcessRunner::preflight(&builder::build_stages(&config.video));
    let supervisor = Arc::new(Mutex::new(PipelineSupervisor::new(
        Arc::new(ProcessRunner::new()),
        config.video.clone(),
        events_tx.clone(),
    )));
    let dispatcher = Arc::new(CommandDispatcher::new(
        Arc::clone(&supervisor),
        events_tx.clone(),
    ));

    let (bus, event_loop) = BusClient::connect(&config.broker, config.topics.clone());

    let bus_task = tokio::spawn(bus::drive(bus.clone(), event_loop, dispatcher));
    let sensor_task = tokio::spawn(publish_readings(
        Thermometer::new(device),
        bus.clone(),
        config.sensor.publish_interval,
        events_tx,
    ));
    let log_task = tokio::spawn(log_events(events_rx));

    wait_for_shutdown().await;
    info!("shutdown requested, releasing pipeline");

    // The same teardown runs on every orderly exit: terminate every
    // tracked stage, then drop the bus connection. A crash that skips
    // this path is covered by kill_on_drop on the stage processes.
    if let StopOutcome::Stopped { failed } = supervisor.lock().await.stop().await {
        if !failed.is_empty() {
            warn!(?failed, "stages did not terminate cleanly during shutdown");
        }
    }
    let _ = bus.disconnect().await;

    bus_task.abort();
    sensor_task.abort();
    log_task.abort();
    Ok(())
}

/// Periodic sensor publish loop.
///
/// Reads block only this task; the command loop keeps running while a
/// conversion is retried.
async fn publish_readings(
    thermometer: Thermometer<W1Device>,
    bus: BusClient,
    interval: Duration,
    events_tx: mpsc::Sender<Event>,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        match thermometer.read().await {
            Ok(reading) => {
                info!(celsius = reading.celsius, retries = reading.retries, "temperature sampled");
                match bus.publish_reading(&reading).await {
                    Ok(()) => {
                        let _ = events_tx
                            .send(Event::ReadingPublished {
                                celsius: reading.celsius,
                            })
                            .await;
                    }
                    Err(error) => warn!(%error, "failed to publish reading"),
                }
            }
            // Transient invalidity is retried inside read(); anything
            // surfacing here is a real fault, but never fatal to the loop.
            Err(error) => error!(%error, "sensor read failed"),
        }
    }
}

/// Drain core events into the structured log.
async fn log_events(mut events_rx: mpsc::Receiver<Event>) {
    while let Some(event) = events_rx.recv().await {
        debug!(?event, "controller event");
    }
}

/// Wait for SIGINT or SIGTERM.
#[cfg(unix)]
async fn wait_for_shutdown() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(error) => {
            error!(%error, "cannot install SIGTERM handler, falling back to ctrl-c");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = term.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown() {
    let _ = tokio::signal::ctrl_c().await;
}
