//! # Component Registry
//!
//! Holds component and driver registrations (instances or factories) until
//! the orchestrator consumes them at startup. Thread-safe for concurrent
//! registration; duplicate identifiers are rejected.

use crate::bus::{BusResult, ComponentMessage, MessageEndpoint};
use crate::component::{Component, Driver, DriverKind};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Errors raised by registry operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Component identifier '{component_id}' is already registered")]
    DuplicateId { component_id: String },
}

/// A registered component plus its driver metadata. `kind` is present only
/// for drivers, which are additionally reachable over the bus.
#[derive(Clone)]
pub struct RegisteredComponent {
    pub component: Arc<dyn Component>,
    pub kind: Option<DriverKind>,
}

impl RegisteredComponent {
    pub fn is_driver(&self) -> bool {
        self.kind.is_some()
    }
}

/// Adapter exposing a component's generic message entry point to the bus
pub struct ComponentEndpoint(pub Arc<dyn Component>);

#[async_trait]
impl MessageEndpoint for ComponentEndpoint {
    async fn handle_message(
        &self,
        message: ComponentMessage,
    ) -> BusResult<Option<ComponentMessage>> {
        self.0.handle_message(message).await
    }
}

type ComponentFactory = Box<dyn Fn() -> Arc<dyn Component> + Send + Sync>;

struct StoredFactory {
    kind: Option<DriverKind>,
    factory: ComponentFactory,
}

/// Registry of components awaiting orchestration
#[derive(Default)]
pub struct ComponentRegistry {
    instances: RwLock<Vec<RegisteredComponent>>,
    factories: RwLock<Vec<StoredFactory>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module instance
    pub fn register_module(&self, component: Arc<dyn Component>) -> Result<(), RegistryError> {
        self.insert(RegisteredComponent {
            component,
            kind: None,
        })
    }

    /// Register a driver instance; its resource kind makes it reachable via
    /// bus broadcast
    pub fn register_driver<D: Driver + 'static>(
        &self,
        driver: Arc<D>,
    ) -> Result<(), RegistryError> {
        let kind = driver.kind();
        self.insert(RegisteredComponent {
            component: driver,
            kind: Some(kind),
        })
    }

    /// Register a factory; instantiated when the orchestrator starts up.
    /// Pass a kind to register the produced component as a driver.
    pub fn register_factory<F>(&self, kind: Option<DriverKind>, factory: F)
    where
        F: Fn() -> Arc<dyn Component> + Send + Sync + 'static,
    {
        self.factories.write().push(StoredFactory {
            kind,
            factory: Box::new(factory),
        });
    }

    /// Instantiate all pending factories, enforcing identifier uniqueness
    /// across the whole registry
    pub fn materialize(&self) -> Result<(), RegistryError> {
        let pending: Vec<StoredFactory> = std::mem::take(&mut *self.factories.write());
        for stored in pending {
            let component = (stored.factory)();
            info!(component_id = %component.id(), "Materialized component factory");
            self.insert(RegisteredComponent {
                component,
                kind: stored.kind,
            })?;
        }
        Ok(())
    }

    /// Snapshot of all registered components in registration order
    pub fn components(&self) -> Vec<RegisteredComponent> {
        self.instances.read().clone()
    }

    /// Look up a registration by component id
    pub fn get(&self, component_id: &str) -> Option<RegisteredComponent> {
        self.instances
            .read()
            .iter()
            .find(|entry| entry.component.id() == component_id)
            .cloned()
    }

    /// Registered drivers of the given kind
    pub fn drivers_of_kind(&self, kind: &DriverKind) -> Vec<RegisteredComponent> {
        self.instances
            .read()
            .iter()
            .filter(|entry| entry.kind.as_ref() == Some(kind))
            .cloned()
            .collect()
    }

    /// Registry statistics
    pub fn stats(&self) -> RegistryStats {
        let instances = self.instances.read();
        let mut drivers_by_kind: HashMap<String, usize> = HashMap::new();
        let mut drivers = 0;
        for entry in instances.iter() {
            if let Some(kind) = &entry.kind {
                drivers += 1;
                *drivers_by_kind.entry(kind.to_string()).or_default() += 1;
            }
        }
        RegistryStats {
            total_components: instances.len(),
            modules: instances.len() - drivers,
            drivers,
            drivers_by_kind,
            pending_factories: self.factories.read().len(),
        }
    }

    fn insert(&self, entry: RegisteredComponent) -> Result<(), RegistryError> {
        let mut instances = self.instances.write();
        let ids: HashSet<&str> = instances.iter().map(|e| e.component.id()).collect();
        if ids.contains(entry.component.id()) {
            return Err(RegistryError::DuplicateId {
                component_id: entry.component.id().to_string(),
            });
        }
        let kind_label = entry.kind.as_ref().map(ToString::to_string);
        info!(
            component_id = %entry.component.id(),
            driver_kind = kind_label.as_deref(),
            "Registered component"
        );
        instances.push(entry);
        Ok(())
    }
}

/// Statistics about registered components
#[derive(Debug, Clone, Default)]
pub struct RegistryStats {
    pub total_components: usize,
    pub modules: usize,
    pub drivers: usize,
    pub drivers_by_kind: HashMap<String, usize>,
    pub pending_factories: usize,
}
