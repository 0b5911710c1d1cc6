//! # Component Contracts
//!
//! The two component flavors managed by the orchestrator: *modules* (business
//! capability components) and *drivers* (external-resource-facing components,
//! additionally reachable over the bus and categorized by resource kind).
//!
//! Implementations provide lifecycle callbacks; the orchestrator's harness
//! owns the lifecycle state, precondition enforcement, and event publication.
//! Capability checks go through the explicit [`Component::tags`] field, never
//! through runtime type inspection.

use crate::bus::{BusResult, ComponentMessage};
use crate::component::context::ComponentContext;
use crate::component::health::HealthProbe;
use crate::priority::Priority;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failure raised by a component callback. Caught at the harness boundary and
/// converted into a failed operation result; never propagated as a panic.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComponentError {
    #[error("{0}")]
    Failed(String),

    #[error("Operation not supported: {0}")]
    NotSupported(String),

    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),
}

impl ComponentError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Result type alias for component callbacks
pub type ComponentResult<T> = Result<T, ComponentError>;

/// Resource category of a driver, used for bus broadcast targeting
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverKind {
    Storage,
    Network,
    Cache,
    Messaging,
    Security,
    Hardware,
    Custom(String),
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage => write!(f, "storage"),
            Self::Network => write!(f, "network"),
            Self::Cache => write!(f, "cache"),
            Self::Messaging => write!(f, "messaging"),
            Self::Security => write!(f, "security"),
            Self::Hardware => write!(f, "hardware"),
            Self::Custom(name) => write!(f, "custom:{name}"),
        }
    }
}

/// A managed component with lifecycle callbacks and identity.
///
/// The identifier is immutable and must be unique within one orchestrator
/// instance. Dependencies are declared as identifiers (or capability tags)
/// of components that must initialize earlier.
#[async_trait]
pub trait Component: Send + Sync {
    /// Unique component identifier
    fn id(&self) -> &str;

    /// Human-readable component name
    fn name(&self) -> &str;

    /// Component version string
    fn version(&self) -> &str {
        "0.1.0"
    }

    /// Identifiers (or tags) of components this one depends on
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    /// Capability tags this component carries
    fn tags(&self) -> Vec<String> {
        Vec::new()
    }

    /// Structured startup priority
    fn priority(&self) -> Priority {
        Priority::default()
    }

    /// Initialize callback; the context is handed over here and stays valid
    /// until disposal
    async fn on_initialize(&self, context: &ComponentContext) -> ComponentResult<()>;

    /// Start callback
    async fn on_start(&self) -> ComponentResult<()> {
        Ok(())
    }

    /// Stop callback
    async fn on_stop(&self) -> ComponentResult<()> {
        Ok(())
    }

    /// Shutdown callback
    async fn on_shutdown(&self) -> ComponentResult<()> {
        Ok(())
    }

    /// Hook invoked after every committed state transition, before the
    /// state-changed event is published
    async fn on_state_changed(
        &self,
        _old_state: crate::state_machine::LifecycleState,
        _new_state: crate::state_machine::LifecycleState,
    ) {
    }

    /// Component-reported health probe; the harness adds timing and
    /// lifecycle-state context
    async fn check_health(&self) -> HealthProbe {
        HealthProbe::default()
    }

    /// Component-specific diagnostics details
    fn diagnostics_details(&self) -> serde_json::Value {
        serde_json::Value::Object(serde_json::Map::new())
    }

    /// Generic bus entry point, invoked when no specific handler is
    /// registered for the message type
    async fn handle_message(
        &self,
        _message: ComponentMessage,
    ) -> BusResult<Option<ComponentMessage>> {
        Ok(None)
    }
}

/// A driver: a component facing an external resource, reachable over the bus
/// and categorized by [`DriverKind`]
pub trait Driver: Component {
    /// Resource category used for broadcast targeting
    fn kind(&self) -> DriverKind;
}
