use crate::component::DriverKind;
use crate::state_machine::StateChanged;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Events published by the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OrchestratorEvent {
    /// A managed component committed a state transition
    ComponentStateChanged(StateChanged),
    /// The engine itself committed a state transition
    EngineStateChanged(StateChanged),
    /// A driver was registered with the bus
    DriverRegistered {
        component_id: String,
        kind: DriverKind,
        registered_at: DateTime<Utc>,
    },
    /// A driver was unregistered from the bus
    DriverUnregistered {
        component_id: String,
        kind: DriverKind,
        unregistered_at: DateTime<Utc>,
    },
}

impl OrchestratorEvent {
    /// String representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ComponentStateChanged(_) => "component_state_changed",
            Self::EngineStateChanged(_) => "engine_state_changed",
            Self::DriverRegistered { .. } => "driver_registered",
            Self::DriverUnregistered { .. } => "driver_unregistered",
        }
    }
}

/// Broadcast publisher for orchestrator events
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<OrchestratorEvent>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event. Publishing with no subscribers is not an error;
    /// events simply go unobserved.
    pub fn publish(&self, event: OrchestratorEvent) {
        let _ = self.sender.send(event);
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<OrchestratorEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(1024)
    }
}
