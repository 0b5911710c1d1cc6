//! # Orchestrator Events
//!
//! Typed lifecycle event stream for observability. Consumers subscribe to a
//! broadcast channel the orchestrator publishes into; there are no mutable
//! callback lists and no ordering dependence between subscribers.

pub mod publisher;

pub use publisher::{EventPublisher, OrchestratorEvent};
