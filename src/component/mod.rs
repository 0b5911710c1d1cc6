//! # Component Contracts
//!
//! Shared contracts for managed components: the `Component`/`Driver` traits,
//! the initialize-time context, operation results, and health/diagnostics
//! snapshot types.

pub mod context;
pub mod health;
pub mod result;
pub mod traits;

pub use context::{ComponentContext, ServiceMap, ShutdownSignal, ShutdownToken};
pub use health::{
    ComponentDiagnostics, ComponentHealth, EngineDiagnostics, EngineHealth, HealthBreakdown,
    HealthProbe, HealthState,
};
pub use result::{AggregateResult, OperationResult};
pub use traits::{Component, ComponentError, ComponentResult, Driver, DriverKind};
