//! # Component Context
//!
//! The context handed to each component at initialize time: typed service
//! lookup, read-only configuration, the engine-wide shutdown token, the bus,
//! and a reference back to the orchestrator. Components keep the context for
//! their whole lifetime.

use crate::bus::CommunicationBus;
use crate::orchestration::Orchestrator;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::watch;

/// Engine-held side of the cooperative cancellation signal
#[derive(Debug)]
pub struct ShutdownSignal {
    sender: watch::Sender<bool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self { sender }
    }

    /// Hand out a token observing this signal
    pub fn token(&self) -> ShutdownToken {
        ShutdownToken {
            receiver: self.sender.subscribe(),
        }
    }

    /// Trigger cancellation; all outstanding tokens observe it
    pub fn trigger(&self) {
        let _ = self.sender.send(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.sender.borrow()
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Component-held cancellation token. Long-running component work is expected
/// to observe this cooperatively.
#[derive(Debug, Clone)]
pub struct ShutdownToken {
    receiver: watch::Receiver<bool>,
}

impl ShutdownToken {
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolve once cancellation is triggered. Also resolves if the engine
    /// side is dropped entirely.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

/// Type-keyed service lookup shared with components
#[derive(Default, Clone)]
pub struct ServiceMap {
    entries: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl ServiceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service instance under its concrete type
    pub fn insert<T: Any + Send + Sync>(&mut self, service: Arc<T>) {
        self.entries.insert(TypeId::of::<T>(), service);
    }

    /// Look up a service by type
    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|service| service.clone().downcast::<T>().ok())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Context handed to components at initialize time. Constructed by the
/// orchestrator; cheap to clone.
#[derive(Clone)]
pub struct ComponentContext {
    services: Arc<ServiceMap>,
    settings: Arc<HashMap<String, serde_json::Value>>,
    shutdown: ShutdownToken,
    bus: Arc<CommunicationBus>,
    engine: Weak<Orchestrator>,
}

impl ComponentContext {
    pub fn new(
        services: Arc<ServiceMap>,
        settings: Arc<HashMap<String, serde_json::Value>>,
        shutdown: ShutdownToken,
        bus: Arc<CommunicationBus>,
        engine: Weak<Orchestrator>,
    ) -> Self {
        Self {
            services,
            settings,
            shutdown,
            bus,
            engine,
        }
    }

    /// Typed service lookup
    pub fn service<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.services.get::<T>()
    }

    /// Read-only configuration value by key
    pub fn setting(&self, key: &str) -> Option<&serde_json::Value> {
        self.settings.get(key)
    }

    /// Token observing the engine-wide shutdown signal
    pub fn shutdown_token(&self) -> ShutdownToken {
        self.shutdown.clone()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// The communication bus
    pub fn bus(&self) -> &Arc<CommunicationBus> {
        &self.bus
    }

    /// Reference back to the owning orchestrator; `None` once the engine has
    /// been dropped
    pub fn engine(&self) -> Option<Arc<Orchestrator>> {
        self.engine.upgrade()
    }

    /// Span factory for component-scoped structured logging
    pub fn component_span(&self, component_id: &str) -> tracing::Span {
        tracing::info_span!("component", id = %component_id)
    }
}
