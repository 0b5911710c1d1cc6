//! # Bus Message Structures
//!
//! Message format for inter-component communication. A message is created by
//! a sending component, consumed at most once by the bus's routing step, and
//! optionally paired with exactly one response correlated by identifier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Reserved target marker for broadcast messages
pub const BROADCAST_TARGET: &str = "*";

/// Header carrying the originating message id on broadcast copies
pub const BROADCAST_OF_HEADER: &str = "broadcast_of";

/// Message type used for responses synthesized from delivery failures
pub const ERROR_MESSAGE_TYPE: &str = "error";

/// Message type used when a correlation is resolved because its target
/// unregistered
pub const UNAVAILABLE_MESSAGE_TYPE: &str = "component_unavailable";

/// A message routed between components over the bus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentMessage {
    /// Unique message identifier, also the correlation key for responses
    pub id: String,
    /// Sending component identifier
    pub source: String,
    /// Target component identifier, or [`BROADCAST_TARGET`]
    pub target: String,
    /// Application-defined message type
    pub message_type: String,
    /// Opaque payload
    pub payload: serde_json::Value,
    /// Whether the sender expects a correlated response
    pub requires_response: bool,
    /// Identifier of the message this one responds to
    pub in_response_to: Option<String>,
    pub sent_at: DateTime<Utc>,
    pub headers: HashMap<String, String>,
}

impl ComponentMessage {
    /// Create a targeted message
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        message_type: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            source: source.into(),
            target: target.into(),
            message_type: message_type.into(),
            payload,
            requires_response: false,
            in_response_to: None,
            sent_at: Utc::now(),
            headers: HashMap::new(),
        }
    }

    /// Create a broadcast message; the bus substitutes each recipient as the
    /// target during fan-out
    pub fn broadcast(
        source: impl Into<String>,
        message_type: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self::new(source, BROADCAST_TARGET, message_type, payload)
    }

    /// Create a response correlated to `original`, sent by `responder`
    pub fn response_to(
        original: &ComponentMessage,
        responder: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        let mut response = Self::new(
            responder,
            original.source.clone(),
            format!("{}.response", original.message_type),
            payload,
        );
        response.in_response_to = Some(original.id.clone());
        response
    }

    /// Create an error response for a delivery that failed inside the target
    pub fn error_response(original: &ComponentMessage, error: impl Into<String>) -> Self {
        let mut response = Self::new(
            original.target.clone(),
            original.source.clone(),
            ERROR_MESSAGE_TYPE,
            serde_json::json!({ "error": error.into() }),
        );
        response.in_response_to = Some(original.id.clone());
        response
    }

    /// Create the synthetic response used when a correlation target
    /// unregisters before responding
    pub fn unavailable_response(
        request_id: &str,
        unregistered: impl Into<String>,
        requester: impl Into<String>,
    ) -> Self {
        let unregistered = unregistered.into();
        let mut response = Self::new(
            unregistered.clone(),
            requester,
            UNAVAILABLE_MESSAGE_TYPE,
            serde_json::json!({ "component": unregistered }),
        );
        response.in_response_to = Some(request_id.to_string());
        response
    }

    /// Copy of a broadcast message addressed to one recipient. The copy gets
    /// its own id; the original id rides in the `broadcast_of` header.
    pub fn for_recipient(&self, recipient: impl Into<String>) -> Self {
        let mut copy = self.clone();
        copy.id = Uuid::new_v4().to_string();
        copy.target = recipient.into();
        copy.headers
            .insert(BROADCAST_OF_HEADER.to_string(), self.id.clone());
        copy
    }

    /// Attach a header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Mark the message as requiring a correlated response
    pub fn requiring_response(mut self) -> Self {
        self.requires_response = true;
        self
    }

    pub fn is_broadcast(&self) -> bool {
        self.target == BROADCAST_TARGET
    }

    pub fn is_response(&self) -> bool {
        self.in_response_to.is_some()
    }
}
