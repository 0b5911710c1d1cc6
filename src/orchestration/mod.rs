//! # Orchestration Engine
//!
//! The engine proper: owns the component collection, drives each component
//! through the lifecycle state machine in resolver-determined order, wires
//! drivers onto the communication bus, and aggregates results, health, and
//! diagnostics.
//!
//! ## Core Components
//!
//! - **Orchestrator**: engine core coordinating registration, startup order,
//!   phase execution (sequential or per-level parallel), and teardown
//! - **ComponentHarness**: per-component lifecycle driver pairing the
//!   implementation with its transition cell and failure containment
//!
//! Forward operations (initialize/start) run in dependency order; teardown
//! (stop/shutdown) runs the last successful forward order reversed verbatim.

pub mod core;
pub mod errors;
pub mod harness;

pub use core::{Orchestrator, ENGINE_ID};
pub use errors::{OrchestrationError, OrchestrationResult};
pub use harness::ComponentHarness;
