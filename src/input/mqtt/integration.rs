//! MQTT integration exposing heat pump entities and write services.
//!
//! Publishes entity state and availability after every snapshot, and routes
//! service calls to the command dispatcher without exposing MQTT internals to
//! main.rs. The broker session is not persistent, so every (re)connect
//! subscribes again and republishes bridge status, configs and state.

use super::client::{MqttClient, MqttMessage};
use super::topics::{
    BRIDGE_OFFLINE, BRIDGE_ONLINE, ServiceResult, Topics, config_payload, state_payload,
};
use crate::commands::CommandDispatcher;
use crate::config::MqttConfig;
use crate::coordinator::UpdateCoordinator;
use crate::entity::{Availability, Entity, EntityFacade};
use log::{debug, info, warn};
use rumqttc::{AsyncClient, QoS};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Last values published per unique id, so unchanged entities are skipped.
#[derive(Debug, Default)]
struct PublishedState {
    state: HashMap<String, String>,
    availability: HashMap<String, Availability>,
}

impl PublishedState {
    /// Topic/payload pairs for every state or availability that changed.
    fn changes(&mut self, entities: &[EntityFacade], topics: &Topics) -> Vec<(String, String)> {
        let mut out = Vec::new();
        for entity in entities {
            let id = entity.identify();

            let availability = entity.availability();
            if self.availability.get(id) != Some(&availability) {
                self.availability.insert(id.to_string(), availability);
                out.push((topics.availability(id), availability.to_string()));
            }

            // Unavailable entities keep their last published state
            if availability == Availability::Unavailable {
                continue;
            }
            let state = state_payload(entity);
            if self.state.get(id) != Some(&state) {
                out.push((topics.state(id), state.clone()));
                self.state.insert(id.to_string(), state);
            }
        }
        out
    }

    /// Forget everything published, so the next call republishes it all.
    fn clear(&mut self) {
        self.state.clear();
        self.availability.clear();
    }
}

/// MQTT Integration orchestrator.
pub struct MqttIntegration {
    config: MqttConfig,
    topics: Topics,
    coordinator: Arc<UpdateCoordinator>,
    dispatcher: Arc<CommandDispatcher>,
    /// How often availability is re-evaluated between snapshots, so failed
    /// refreshes show up as stale.
    availability_check: Duration,
}

impl MqttIntegration {
    pub fn new(
        config: MqttConfig,
        topic_prefix: impl Into<String>,
        coordinator: Arc<UpdateCoordinator>,
        dispatcher: Arc<CommandDispatcher>,
        availability_check: Duration,
    ) -> Self {
        Self {
            config,
            topics: Topics::new(topic_prefix),
            coordinator,
            dispatcher,
            availability_check,
        }
    }

    /// Start the MQTT integration.
    ///
    /// Spawns a background task that connects to the broker, publishes entity
    /// descriptions and keeps state topics current. Returns a JoinHandle that
    /// can be used to abort the task on shutdown.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Topic filters to subscribe on every connect.
    fn subscriptions(&self) -> Vec<String> {
        vec![self.topics.service_filter()]
    }

    /// Retained topic/payload pairs published on every connect.
    fn connect_publications(&self) -> Vec<(String, String)> {
        let mut out = vec![(self.topics.bridge_status(), BRIDGE_ONLINE.to_string())];
        for entity in self.dispatcher.entities() {
            let payload = config_payload(entity, &self.topics).to_string();
            out.push((self.topics.config(entity.identify()), payload));
        }
        out
    }

    /// Restore subscriptions and retained topics after a ConnAck.
    async fn on_connect(&self, client: &AsyncClient, published: &mut PublishedState) {
        for filter in self.subscriptions() {
            if let Err(e) = client.subscribe(&filter, QoS::AtLeastOnce).await {
                warn!("[MQTT] Failed to subscribe to {}: {:?}", filter, e);
            }
        }
        for (topic, payload) in self.connect_publications() {
            publish(client, topic, payload).await;
        }
        published.clear();
        self.publish_changes(client, published).await;
    }

    async fn run(self) {
        if self.dispatcher.entities().is_empty() {
            info!("[MQTT] No entities configured, skipping MQTT integration");
            return;
        }

        info!(
            "[MQTT] Connecting to {}:{}",
            self.config.broker_host, self.config.broker_port
        );

        let mqtt_client = MqttClient::new(
            &self.config,
            Some((self.topics.bridge_status(), BRIDGE_OFFLINE.to_string())),
        );
        let client = mqtt_client.client();

        let (msg_tx, mut msg_rx) = mpsc::channel::<MqttMessage>(64);
        let (connections_tx, mut connections) = watch::channel(0u64);

        // Start MQTT event loop FIRST (so it can establish connection)
        let mqtt_loop = tokio::spawn(async move {
            mqtt_client.run(msg_tx, connections_tx).await;
        });

        let first = connections.wait_for(|n| *n > 0);
        match tokio::time::timeout(Duration::from_secs(10), first).await {
            Ok(Ok(_)) => {
                info!("[MQTT] Connection established, subscribing to topics");
            }
            Ok(Err(_)) => {
                warn!("[MQTT] Connection signal channel dropped");
                return;
            }
            Err(_) => {
                warn!("[MQTT] Connection timeout after 10 seconds");
                mqtt_loop.abort();
                return;
            }
        }

        let mut published = PublishedState::default();
        self.on_connect(&client, &mut published).await;

        info!(
            "[MQTT] Integration started with {} entities under {}",
            self.dispatcher.entities().len(),
            self.topics.prefix()
        );

        let mut snapshots = self.coordinator.subscribe();
        let mut availability_check = tokio::time::interval(self.availability_check);

        loop {
            tokio::select! {
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    self.publish_changes(&client, &mut published).await;
                }
                _ = availability_check.tick() => {
                    self.publish_changes(&client, &mut published).await;
                }
                changed = connections.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    info!("[MQTT] Reconnected, restoring subscriptions and retained topics");
                    self.on_connect(&client, &mut published).await;
                }
                msg = msg_rx.recv() => {
                    let Some(msg) = msg else { break };
                    self.handle_message(&client, msg);
                }
            }
        }

        mqtt_loop.abort();
    }

    async fn publish_changes(&self, client: &AsyncClient, published: &mut PublishedState) {
        let changes = published.changes(self.dispatcher.entities(), &self.topics);
        if !changes.is_empty() {
            debug!("[MQTT] Publishing {} changed topic(s)", changes.len());
        }
        for (topic, payload) in changes {
            publish(client, topic, payload).await;
        }
    }

    /// Dispatch a service call in its own task and reply on the result topic.
    fn handle_message(&self, client: &AsyncClient, msg: MqttMessage) {
        let Some(service) = self.topics.parse_service(&msg.topic) else {
            debug!("[MQTT] Ignoring message on {}", msg.topic);
            return;
        };

        info!("[MQTT] Service call {}", service);
        let reply_topic = self.topics.service_result(service);
        let service = service.to_string();
        let dispatcher = self.dispatcher.clone();
        let client = client.clone();

        tokio::spawn(async move {
            let result = dispatcher.dispatch_json(&service, &msg.payload).await;
            let reply = ServiceResult::from(&result);
            match serde_json::to_string(&reply) {
                Ok(payload) => {
                    if let Err(e) = client
                        .publish(&reply_topic, QoS::AtLeastOnce, false, payload)
                        .await
                    {
                        warn!("[MQTT] Failed to reply on {}: {:?}", reply_topic, e);
                    }
                }
                Err(e) => warn!("[MQTT] Failed to encode reply for {}: {}", service, e),
            }
        });
    }
}

/// Publish a retained message, logging failures.
async fn publish(client: &AsyncClient, topic: String, payload: String) {
    if let Err(e) = client.publish(&topic, QoS::AtLeastOnce, true, payload).await {
        warn!("[MQTT] Failed to publish {}: {:?}", topic, e);
    }
}
