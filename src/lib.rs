#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Conductor Core
//!
//! In-process component orchestration engine. Manages a collection of
//! long-lived components (modules and drivers) through a shared lifecycle,
//! computes startup/shutdown order from declared dependencies and priorities,
//! and provides an asynchronous message bus for components to call each other
//! without direct references.
//!
//! ## Architecture
//!
//! - [`component`] - component traits, context, results, health/diagnostics
//! - [`state_machine`] - per-component lifecycle state enforcement
//! - [`priority`] - effective priority ranking and ordering decisions
//! - [`resolver`] - dependency-ordered startup planning and level partitions
//! - [`bus`] - registration, targeted delivery, request/response, broadcast
//! - [`orchestration`] - the engine driving everything above
//! - [`registry`] - component/driver/factory registration
//! - [`events`] - typed lifecycle event stream for observability
//! - [`config`] - layered configuration with environment overrides
//!
//! All state is in-memory and lost on process exit; this is a single-process
//! coordinator, not a distributed scheduler.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use conductor_core::config::ConductorConfig;
//! use conductor_core::orchestration::Orchestrator;
//! use conductor_core::registry::ComponentRegistry;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(ComponentRegistry::new());
//! // register components/drivers on the registry or the engine ...
//!
//! let engine = Orchestrator::new(ConductorConfig::load()?, registry);
//! let initialized = engine.initialize().await;
//! assert!(initialized.success);
//!
//! let started = engine.start().await;
//! println!("started: {}", started.message);
//!
//! engine.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod bus;
pub mod component;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod orchestration;
pub mod priority;
pub mod registry;
pub mod resolver;
pub mod state_machine;

pub use bus::{CommunicationBus, ComponentMessage};
pub use component::{
    AggregateResult, Component, ComponentContext, ComponentError, ComponentResult, Driver,
    DriverKind, EngineDiagnostics, EngineHealth, HealthProbe, HealthState, OperationResult,
};
pub use config::ConductorConfig;
pub use error::{ConductorError, Result};
pub use events::{EventPublisher, OrchestratorEvent};
pub use orchestration::{Orchestrator, ENGINE_ID};
pub use priority::{Priority, PriorityLevel};
pub use registry::ComponentRegistry;
pub use resolver::{DependencyResolver, ResolutionError};
pub use state_machine::{LifecyclePhase, LifecycleState, StateChanged};
