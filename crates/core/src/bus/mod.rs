//! MQTT bus collaborator.
//!
//! Thin wrapper over `rumqttc`: connection options from configuration, a
//! retained at-most-once publish for readings, and an event loop that
//! hands command-topic payloads to the dispatcher. Reconnection is the
//! client library's concern; poll errors are logged and the loop backs
//! off briefly before retrying.

use crate::config::{BrokerConfig, TopicsConfig};
use crate::dispatch::CommandDispatcher;
use aqm_protocol::Reading;
use rumqttc::{AsyncClient, ClientError, Event as MqttEvent, EventLoop, MqttOptions, Packet, QoS};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

const KEEP_ALIVE: Duration = Duration::from_secs(60);
const REQUEST_CHANNEL_CAPACITY: usize = 10;
const POLL_BACKOFF: Duration = Duration::from_secs(1);

/// Handle for publishing to the bus.
///
/// Cheap to clone; all clones share one connection.
#[derive(Clone)]
pub struct BusClient {
    client: AsyncClient,
    topics: TopicsConfig,
}

impl BusClient {
    /// Build the client and its event loop from configuration.
    ///
    /// The connection is established lazily by the event loop, so this
    /// never blocks; connect failures surface as poll errors in
    /// [`drive`].
    pub fn connect(broker: &BrokerConfig, topics: TopicsConfig) -> (Self, EventLoop) {
        let mut options = MqttOptions::new(broker.client_id.clone(), broker.host.clone(), broker.port);
        options.set_credentials(broker.username.clone(), broker.password.clone());
        options.set_keep_alive(KEEP_ALIVE);

        let (client, event_loop) = AsyncClient::new(options, REQUEST_CHANNEL_CAPACITY);
        (Self { client, topics }, event_loop)
    }

    /// Publish one temperature reading: retained, at-most-once.
    ///
    /// Retained delivery means late subscribers immediately see the most
    /// recent temperature.
    pub async fn publish_reading(&self, reading: &Reading) -> Result<(), ClientError> {
        self.client
            .publish(
                self.topics.temperature.as_str(),
                QoS::AtMostOnce,
                true,
                reading.payload(),
            )
            .await
    }

    /// Subscribe to the command topic.
    ///
    /// Called on every ConnAck so the subscription survives reconnects.
    pub async fn subscribe_commands(&self) -> Result<(), ClientError> {
        self.client
            .subscribe(self.topics.command.as_str(), QoS::AtMostOnce)
            .await
    }

    /// Disconnect from the broker.
    pub async fn disconnect(&self) -> Result<(), ClientError> {
        self.client.disconnect().await
    }

    pub fn command_topic(&self) -> &str {
        &self.topics.command
    }
}

/// Drive the bus event loop, dispatching command-topic payloads.
///
/// Runs until its task is aborted by the runtime's shutdown path. Each
/// command is dispatched to completion before the next poll, which keeps
/// command handling serialized without blocking the sensor task.
pub async fn drive(client: BusClient, mut event_loop: EventLoop, dispatcher: Arc<CommandDispatcher>) {
    loop {
        match event_loop.poll().await {
            Ok(MqttEvent::Incoming(Packet::ConnAck(ack))) => {
                info!(code = ?ack.code, "connected to broker");
                if let Err(error) = client.subscribe_commands().await {
                    error!(%error, "failed to subscribe to command topic");
                }
            }
            Ok(MqttEvent::Incoming(Packet::Publish(publish)))
                if publish.topic == client.command_topic() =>
            {
                let payload = String::from_utf8_lossy(&publish.payload).into_owned();
                debug!(topic = %publish.topic, payload = %payload, "command payload received");
                dispatcher.dispatch(&payload).await;
            }
            Ok(MqttEvent::Incoming(Packet::Disconnect)) => {
                warn!("broker requested disconnect");
            }
            Ok(_) => {}
            Err(error) => {
                warn!(%error, "bus connection error, retrying");
                sleep(POLL_BACKOFF).await;
            }
        }
    }
}
