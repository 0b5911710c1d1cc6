//! # Communication Bus
//!
//! Registry of live component endpoints plus message routing, correlation,
//! and broadcast. Components call each other through the bus without direct
//! references.
//!
//! ## Delivery rules
//!
//! - A message to an unregistered target yields no response, distinguishable
//!   from an explicit empty response.
//! - A specific handler registered for (target id, message type) wins over
//!   the target's generic entry point.
//! - Handler and endpoint failures are converted into an "error" response
//!   message correlated to the original; they never propagate to the caller.
//!
//! All tables are concurrent maps keyed by identifier, safe for concurrent
//! register/unregister/send from many components at once.

use crate::bus::errors::{BusError, BusResult};
use crate::bus::message::ComponentMessage;
use crate::component::DriverKind;
use async_trait::async_trait;
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Generic message-handling entry point of a registered component
#[async_trait]
pub trait MessageEndpoint: Send + Sync {
    async fn handle_message(
        &self,
        message: ComponentMessage,
    ) -> BusResult<Option<ComponentMessage>>;
}

/// A handler registered for one (component id, message type) pair
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: ComponentMessage) -> BusResult<Option<ComponentMessage>>;
}

struct FnMessageHandler<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> MessageHandler for FnMessageHandler<F>
where
    F: Fn(ComponentMessage) -> Fut + Send + Sync,
    Fut: Future<Output = BusResult<Option<ComponentMessage>>> + Send,
{
    async fn handle(&self, message: ComponentMessage) -> BusResult<Option<ComponentMessage>> {
        (self.f)(message).await
    }
}

/// Wrap an async closure as a [`MessageHandler`]
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn MessageHandler>
where
    F: Fn(ComponentMessage) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = BusResult<Option<ComponentMessage>>> + Send + 'static,
{
    Arc::new(FnMessageHandler { f })
}

struct EndpointRegistration {
    endpoint: Arc<dyn MessageEndpoint>,
    kind: Option<DriverKind>,
}

struct PendingRequest {
    requester: String,
    target: String,
    sender: oneshot::Sender<ComponentMessage>,
}

/// Bus statistics snapshot
#[derive(Debug, Clone, Default)]
pub struct BusStats {
    pub registered_endpoints: usize,
    pub registered_handlers: usize,
    pub pending_requests: usize,
}

/// Asynchronous inter-component message bus
pub struct CommunicationBus {
    endpoints: DashMap<String, EndpointRegistration>,
    handlers: DashMap<(String, String), Arc<dyn MessageHandler>>,
    pending: DashMap<String, PendingRequest>,
    default_timeout: Duration,
}

impl CommunicationBus {
    pub fn new(default_timeout: Duration) -> Self {
        Self {
            endpoints: DashMap::new(),
            handlers: DashMap::new(),
            pending: DashMap::new(),
            default_timeout,
        }
    }

    /// Register a component endpoint. Drivers carry their resource kind so
    /// broadcasts can target them by category.
    pub fn register(
        &self,
        component_id: impl Into<String>,
        kind: Option<DriverKind>,
        endpoint: Arc<dyn MessageEndpoint>,
    ) {
        let component_id = component_id.into();
        if self.endpoints.contains_key(&component_id) {
            warn!(component_id = %component_id, "Replacing existing bus registration");
        }
        self.endpoints
            .insert(component_id.clone(), EndpointRegistration { endpoint, kind });
        info!(component_id = %component_id, "Registered component on bus");
    }

    /// Unregister a component: removes its endpoint and specific handlers,
    /// and resolves correlations waiting on it with a synthetic
    /// "component unavailable" response so callers are not left blocked.
    pub fn unregister(&self, component_id: &str) -> bool {
        let removed = self.endpoints.remove(component_id).is_some();
        self.handlers.retain(|(id, _), _| id != component_id);

        let waiting: Vec<String> = self
            .pending
            .iter()
            .filter(|entry| entry.value().target == component_id)
            .map(|entry| entry.key().clone())
            .collect();
        for request_id in waiting {
            if let Some((_, pending)) = self.pending.remove(&request_id) {
                let response = ComponentMessage::unavailable_response(
                    &request_id,
                    component_id,
                    pending.requester,
                );
                let _ = pending.sender.send(response);
            }
        }

        if removed {
            info!(component_id = %component_id, "Unregistered component from bus");
        }
        removed
    }

    /// Check whether a component is currently registered
    pub fn is_registered(&self, component_id: &str) -> bool {
        self.endpoints.contains_key(component_id)
    }

    /// Register a handler for a specific (component id, message type) pair,
    /// taking precedence over the component's generic entry point
    pub fn register_handler(
        &self,
        component_id: impl Into<String>,
        message_type: impl Into<String>,
        handler: Arc<dyn MessageHandler>,
    ) {
        let key = (component_id.into(), message_type.into());
        if self.handlers.contains_key(&key) {
            warn!(
                component_id = %key.0,
                message_type = %key.1,
                "Replacing existing message handler"
            );
        }
        self.handlers.insert(key, handler);
    }

    /// Route a message to its target.
    ///
    /// Returns `Ok(None)` when the target is unregistered or produced no
    /// response. A message carrying `in_response_to` that matches a parked
    /// correlation resolves that correlation instead of being routed.
    pub async fn send(
        &self,
        message: ComponentMessage,
    ) -> BusResult<Option<ComponentMessage>> {
        if message.is_broadcast() {
            return Err(BusError::invalid_target(
                message.target,
                "broadcast messages must go through broadcast()",
            ));
        }

        if let Some(request_id) = &message.in_response_to {
            if let Some((_, pending)) = self.pending.remove(request_id) {
                let _ = pending.sender.send(message);
                return Ok(None);
            }
            debug!(
                request_id = %request_id,
                "Dropping response with no parked correlation"
            );
            return Ok(None);
        }

        let Some(endpoint) = self.lookup(&message.target) else {
            debug!(
                target = %message.target,
                message_type = %message.message_type,
                "Message target not registered"
            );
            return Ok(None);
        };

        Ok(self.deliver(&endpoint, message).await)
    }

    /// Send a message and wait up to `timeout` for a correlated response.
    ///
    /// An immediate response from the send wins; otherwise a correlation
    /// record is parked and resolved by a later response arriving via
    /// [`send`](Self::send) or by the target unregistering. Timeout yields
    /// `Ok(None)` and discards the record.
    pub async fn send_and_wait(
        &self,
        message: ComponentMessage,
        timeout: Option<Duration>,
    ) -> BusResult<Option<ComponentMessage>> {
        let timeout = timeout.unwrap_or(self.default_timeout);
        let message = message.requiring_response();

        if !self.endpoints.contains_key(&message.target) {
            return Ok(None);
        }

        let (sender, receiver) = oneshot::channel();
        self.pending.insert(
            message.id.clone(),
            PendingRequest {
                requester: message.source.clone(),
                target: message.target.clone(),
                sender,
            },
        );

        let request_id = message.id.clone();
        let immediate = match self.send(message).await {
            Ok(response) => response,
            Err(error) => {
                self.pending.remove(&request_id);
                return Err(error);
            }
        };
        if let Some(response) = immediate {
            self.pending.remove(&request_id);
            return Ok(Some(response));
        }

        match tokio::time::timeout(timeout, receiver).await {
            Ok(Ok(response)) => Ok(Some(response)),
            Ok(Err(_)) => {
                self.pending.remove(&request_id);
                Ok(None)
            }
            Err(_) => {
                self.pending.remove(&request_id);
                debug!(request_id = %request_id, "Correlated request timed out");
                Ok(None)
            }
        }
    }

    /// Fan a message out to every registered driver of the given kind,
    /// substituting each recipient as the target. Individual delivery
    /// failures are logged and do not abort the remaining fan-out. The
    /// sender is not a recipient of its own broadcast. Returns the number of
    /// recipients delivered to.
    pub async fn broadcast(
        &self,
        kind: &DriverKind,
        message: ComponentMessage,
    ) -> BusResult<usize> {
        let recipients: Vec<(String, Arc<dyn MessageEndpoint>)> = self
            .endpoints
            .iter()
            .filter(|entry| {
                entry.value().kind.as_ref() == Some(kind) && entry.key() != &message.source
            })
            .map(|entry| (entry.key().clone(), entry.value().endpoint.clone()))
            .collect();

        let mut delivered = 0;
        for (recipient, endpoint) in recipients {
            let copy = message.for_recipient(&recipient);
            self.deliver(&endpoint, copy).await;
            delivered += 1;
        }

        debug!(
            kind = %kind,
            message_type = %message.message_type,
            delivered = delivered,
            "Broadcast complete"
        );
        Ok(delivered)
    }

    /// Bus statistics snapshot
    pub fn stats(&self) -> BusStats {
        BusStats {
            registered_endpoints: self.endpoints.len(),
            registered_handlers: self.handlers.len(),
            pending_requests: self.pending.len(),
        }
    }

    fn lookup(&self, component_id: &str) -> Option<Arc<dyn MessageEndpoint>> {
        self.endpoints
            .get(component_id)
            .map(|entry| entry.endpoint.clone())
    }

    /// Invoke the specific handler or the generic entry point; failures
    /// become correlated error responses.
    async fn deliver(
        &self,
        endpoint: &Arc<dyn MessageEndpoint>,
        message: ComponentMessage,
    ) -> Option<ComponentMessage> {
        let handler_key = (message.target.clone(), message.message_type.clone());
        let handler = self.handlers.get(&handler_key).map(|h| h.value().clone());

        let outcome = match handler {
            Some(handler) => handler.handle(message.clone()).await,
            None => endpoint.handle_message(message.clone()).await,
        };

        match outcome {
            Ok(response) => response,
            Err(error) => {
                warn!(
                    target = %message.target,
                    message_type = %message.message_type,
                    error = %error,
                    "Delivery failed, converting to error response"
                );
                Some(ComponentMessage::error_response(&message, error.to_string()))
            }
        }
    }
}

impl Default for CommunicationBus {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::message::{ERROR_MESSAGE_TYPE, UNAVAILABLE_MESSAGE_TYPE};

    struct EchoEndpoint;

    #[async_trait]
    impl MessageEndpoint for EchoEndpoint {
        async fn handle_message(
            &self,
            message: ComponentMessage,
        ) -> BusResult<Option<ComponentMessage>> {
            Ok(Some(ComponentMessage::response_to(
                &message,
                message.target.clone(),
                message.payload.clone(),
            )))
        }
    }

    struct SilentEndpoint;

    #[async_trait]
    impl MessageEndpoint for SilentEndpoint {
        async fn handle_message(
            &self,
            _message: ComponentMessage,
        ) -> BusResult<Option<ComponentMessage>> {
            Ok(None)
        }
    }

    struct FailingEndpoint;

    #[async_trait]
    impl MessageEndpoint for FailingEndpoint {
        async fn handle_message(
            &self,
            message: ComponentMessage,
        ) -> BusResult<Option<ComponentMessage>> {
            Err(BusError::handler_failed(
                message.target,
                message.message_type,
                "handler exploded",
            ))
        }
    }

    #[tokio::test]
    async fn test_send_to_unregistered_target_returns_none() {
        let bus = CommunicationBus::default();
        let message = ComponentMessage::new("a", "ghost", "ping", serde_json::Value::Null);
        let response = bus.send(message).await.unwrap();
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_send_invokes_generic_entry_point() {
        let bus = CommunicationBus::default();
        bus.register("echo", None, Arc::new(EchoEndpoint));

        let message = ComponentMessage::new("a", "echo", "ping", serde_json::json!({"n": 7}));
        let response = bus.send(message).await.unwrap().unwrap();
        assert_eq!(response.payload["n"], 7);
    }

    #[tokio::test]
    async fn test_specific_handler_wins_over_entry_point() {
        let bus = CommunicationBus::default();
        bus.register("svc", None, Arc::new(EchoEndpoint));
        bus.register_handler(
            "svc",
            "special",
            handler_fn(|message: ComponentMessage| async move {
                Ok(Some(ComponentMessage::response_to(
                    &message,
                    "svc",
                    serde_json::json!("handled"),
                )))
            }),
        );

        let special = ComponentMessage::new("a", "svc", "special", serde_json::Value::Null);
        let response = bus.send(special).await.unwrap().unwrap();
        assert_eq!(response.payload, serde_json::json!("handled"));

        let generic = ComponentMessage::new("a", "svc", "other", serde_json::json!(1));
        let response = bus.send(generic).await.unwrap().unwrap();
        assert_eq!(response.payload, serde_json::json!(1));
    }

    #[tokio::test]
    async fn test_delivery_failure_becomes_error_response() {
        let bus = CommunicationBus::default();
        bus.register("broken", None, Arc::new(FailingEndpoint));

        let message = ComponentMessage::new("a", "broken", "ping", serde_json::Value::Null);
        let response = bus.send(message).await.unwrap().unwrap();
        assert_eq!(response.message_type, ERROR_MESSAGE_TYPE);
        assert!(response.payload["error"]
            .as_str()
            .unwrap()
            .contains("handler exploded"));
    }

    #[tokio::test]
    async fn test_send_and_wait_times_out_to_none() {
        let bus = CommunicationBus::default();
        bus.register("slow", None, Arc::new(SilentEndpoint));

        let message = ComponentMessage::new("a", "slow", "ask", serde_json::Value::Null);
        let response = bus
            .send_and_wait(message, Some(Duration::from_millis(50)))
            .await
            .unwrap();
        assert!(response.is_none());
        assert_eq!(bus.stats().pending_requests, 0);
    }

    #[tokio::test]
    async fn test_send_and_wait_resolved_by_async_response() {
        let bus = Arc::new(CommunicationBus::default());
        bus.register("worker", None, Arc::new(SilentEndpoint));
        bus.register("caller", None, Arc::new(SilentEndpoint));

        let request = ComponentMessage::new("caller", "worker", "job", serde_json::Value::Null);
        let request_id = request.id.clone();

        let responder_bus = bus.clone();
        let responder = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let mut response = ComponentMessage::new(
                "worker",
                "caller",
                "job.response",
                serde_json::json!("done"),
            );
            response.in_response_to = Some(request_id);
            responder_bus.send(response).await.unwrap();
        });

        let response = bus
            .send_and_wait(request, Some(Duration::from_secs(1)))
            .await
            .unwrap()
            .expect("response should arrive before timeout");
        assert_eq!(response.payload, serde_json::json!("done"));
        responder.await.unwrap();
    }

    #[tokio::test]
    async fn test_unregister_resolves_pending_with_unavailable() {
        let bus = Arc::new(CommunicationBus::default());
        bus.register("worker", None, Arc::new(SilentEndpoint));

        let request = ComponentMessage::new("caller", "worker", "job", serde_json::Value::Null);
        let wait_bus = bus.clone();
        let waiter = tokio::spawn(async move {
            wait_bus
                .send_and_wait(request, Some(Duration::from_secs(5)))
                .await
                .unwrap()
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(bus.unregister("worker"));

        let response = waiter.await.unwrap().expect("synthetic response expected");
        assert_eq!(response.message_type, UNAVAILABLE_MESSAGE_TYPE);
        assert_eq!(response.payload["component"], "worker");
    }

    #[tokio::test]
    async fn test_broadcast_targets_matching_kind_only() {
        let bus = CommunicationBus::default();
        bus.register("disk", Some(DriverKind::Storage), Arc::new(EchoEndpoint));
        bus.register("s3", Some(DriverKind::Storage), Arc::new(EchoEndpoint));
        bus.register("redis", Some(DriverKind::Cache), Arc::new(EchoEndpoint));
        bus.register("module", None, Arc::new(EchoEndpoint));

        let message = ComponentMessage::broadcast("mon", "flush", serde_json::Value::Null);
        let delivered = bus.broadcast(&DriverKind::Storage, message).await.unwrap();
        assert_eq!(delivered, 2);
    }

    #[tokio::test]
    async fn test_broadcast_survives_individual_failures() {
        let bus = CommunicationBus::default();
        bus.register("good", Some(DriverKind::Cache), Arc::new(EchoEndpoint));
        bus.register("bad", Some(DriverKind::Cache), Arc::new(FailingEndpoint));

        let message = ComponentMessage::broadcast("mon", "flush", serde_json::Value::Null);
        let delivered = bus.broadcast(&DriverKind::Cache, message).await.unwrap();
        assert_eq!(delivered, 2);
    }

    #[tokio::test]
    async fn test_send_rejects_broadcast_marker() {
        let bus = CommunicationBus::default();
        let message = ComponentMessage::broadcast("a", "ping", serde_json::Value::Null);
        assert!(bus.send(message).await.is_err());
    }
}
