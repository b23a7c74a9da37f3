//! MQTT surface of the bridge.
//!
//! Publishes entity descriptions, state and availability under a topic
//! prefix, and accepts write service calls as JSON messages.

mod client;
mod integration;
pub mod topics;

pub use client::{MqttClient, MqttMessage};
pub use integration::MqttIntegration;
pub use topics::{ServiceResult, Topics};
