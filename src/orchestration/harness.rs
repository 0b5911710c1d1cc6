//! # Component Harness
//!
//! Pairs a component implementation with its lifecycle cell and drives the
//! four phase operations through it. The harness owns precondition
//! enforcement, the state-changed hook/event sequence, failure containment,
//! and health/diagnostics assembly; components only supply callbacks.

use crate::component::{
    Component, ComponentContext, ComponentDiagnostics, ComponentError, ComponentHealth,
    HealthState, OperationResult,
};
use crate::events::{EventPublisher, OrchestratorEvent};
use crate::logging::log_lifecycle_operation;
use crate::state_machine::{
    LifecycleCell, LifecyclePhase, LifecycleState, PhaseAdmission, StateChanged,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

/// Lifecycle driver for one managed component
pub struct ComponentHarness {
    component: Arc<dyn Component>,
    cell: LifecycleCell,
    events: EventPublisher,
    phase_timeout: Option<Duration>,
}

impl ComponentHarness {
    pub fn new(component: Arc<dyn Component>, events: EventPublisher) -> Self {
        let cell = LifecycleCell::new(component.id());
        Self {
            component,
            cell,
            events,
            phase_timeout: None,
        }
    }

    /// Bound every phase callback; a component exceeding the limit is moved
    /// to Error instead of stalling the engine operation
    pub fn with_phase_timeout(mut self, timeout: Duration) -> Self {
        self.phase_timeout = Some(timeout);
        self
    }

    pub fn component(&self) -> &Arc<dyn Component> {
        &self.component
    }

    pub fn id(&self) -> &str {
        self.component.id()
    }

    pub fn state(&self) -> LifecycleState {
        self.cell.current()
    }

    /// Initialize the component. Requires the Created state.
    pub async fn initialize(&self, context: &ComponentContext) -> OperationResult {
        self.execute(LifecyclePhase::Initialize, Some(context)).await
    }

    /// Start the component. Requires the Initialized state.
    pub async fn start(&self) -> OperationResult {
        self.execute(LifecyclePhase::Start, None).await
    }

    /// Stop the component. A no-op success when not running.
    pub async fn stop(&self) -> OperationResult {
        self.execute(LifecyclePhase::Stop, None).await
    }

    /// Shut the component down. Idempotent; stops first when running.
    pub async fn shutdown(&self) -> OperationResult {
        if self.cell.current().is_active() {
            let stopped = self.stop().await;
            if !stopped.success {
                warn!(
                    component_id = %self.id(),
                    error = stopped.error.as_deref(),
                    "Stop before shutdown failed, continuing teardown"
                );
            }
        }
        self.execute(LifecyclePhase::Shutdown, None).await
    }

    /// Release the component. Attempts a graceful shutdown first, swallowing
    /// and logging secondary failures; idempotent.
    pub async fn dispose(&self) {
        if self.cell.current() == LifecycleState::Disposed {
            return;
        }
        if !self.cell.current().is_shut_down() {
            let result = self.shutdown().await;
            if !result.success {
                warn!(
                    component_id = %self.id(),
                    error = result.error.as_deref(),
                    "Shutdown during disposal failed, disposing anyway"
                );
            }
        }
        if let Some(change) = self.cell.mark_disposed() {
            self.commit(change).await;
        }
    }

    /// Health snapshot: the component's own probe, with the lifecycle state
    /// overriding an optimistic report (Error is at least critical, any
    /// non-running state at least a warning).
    pub async fn health(&self) -> ComponentHealth {
        let started = Instant::now();
        let probe = self.component.check_health().await;
        let response_time = started.elapsed();

        let state = self.cell.current();
        let floor = if state.is_error() {
            HealthState::Critical
        } else if state.is_active() {
            HealthState::Healthy
        } else {
            HealthState::Warning
        };

        let (status, message) = if floor > probe.state {
            (floor, format!("component is '{state}'"))
        } else {
            (probe.state, probe.message)
        };

        ComponentHealth {
            state: status,
            message,
            response_time,
            checked_at: Utc::now(),
        }
    }

    /// Diagnostics snapshot under the given execution context
    pub fn diagnostics(&self, context: Option<&str>) -> ComponentDiagnostics {
        ComponentDiagnostics {
            id: self.component.id().to_string(),
            name: self.component.name().to_string(),
            version: self.component.version().to_string(),
            state: self.cell.current(),
            dependencies: self.component.dependencies(),
            effective_rank: self.component.priority().effective_rank(context),
            details: self.component.diagnostics_details(),
        }
    }

    async fn execute(
        &self,
        phase: LifecyclePhase,
        context: Option<&ComponentContext>,
    ) -> OperationResult {
        let started = Instant::now();

        let change = match self.cell.begin_phase(phase) {
            PhaseAdmission::Skip { current } => {
                let result = OperationResult::success(
                    format!(
                        "{} skipped: component '{}' is '{current}'",
                        phase.phase_name(),
                        self.id()
                    ),
                    started.elapsed(),
                );
                log_lifecycle_operation(phase.phase_name(), self.id(), "skipped", None, None);
                return result;
            }
            PhaseAdmission::Refused { current: _, reason } => {
                log_lifecycle_operation(
                    phase.phase_name(),
                    self.id(),
                    "refused",
                    None,
                    Some(&reason),
                );
                return OperationResult::failure(
                    format!("{} precondition failed", phase.phase_name()),
                    reason,
                    started.elapsed(),
                );
            }
            PhaseAdmission::Proceed(change) => change,
        };
        self.commit(change).await;

        let callback = async {
            match phase {
                LifecyclePhase::Initialize => {
                    let context = context.expect("initialize requires a component context");
                    self.component.on_initialize(context).await
                }
                LifecyclePhase::Start => self.component.on_start().await,
                LifecyclePhase::Stop => self.component.on_stop().await,
                LifecyclePhase::Shutdown => self.component.on_shutdown().await,
            }
        };
        let outcome = match self.phase_timeout {
            Some(limit) => match tokio::time::timeout(limit, callback).await {
                Ok(outcome) => outcome,
                Err(_) => Err(ComponentError::failed(format!(
                    "{} timed out after {}ms",
                    phase.phase_name(),
                    limit.as_millis()
                ))),
            },
            None => callback.await,
        };

        let duration = started.elapsed();
        match outcome {
            Ok(()) => {
                let change = self.cell.complete_phase(phase);
                self.commit(change).await;
                log_lifecycle_operation(
                    phase.phase_name(),
                    self.id(),
                    "succeeded",
                    Some(duration.as_millis() as u64),
                    None,
                );
                OperationResult::success(
                    format!("{} completed for '{}'", phase.phase_name(), self.id()),
                    duration,
                )
            }
            Err(error) => {
                let change = self.cell.fail_phase();
                self.commit(change).await;
                log_lifecycle_operation(
                    phase.phase_name(),
                    self.id(),
                    "failed",
                    Some(duration.as_millis() as u64),
                    Some(&error.to_string()),
                );
                OperationResult::failure(
                    format!("{} failed for '{}'", phase.phase_name(), self.id()),
                    error.to_string(),
                    duration,
                )
            }
        }
    }

    /// Hook-then-event sequence for a committed transition
    async fn commit(&self, change: StateChanged) {
        self.component
            .on_state_changed(change.old_state, change.new_state)
            .await;
        self.events
            .publish(OrchestratorEvent::ComponentStateChanged(change));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentError, ComponentResult, HealthProbe};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct ProbeComponent {
        id: String,
        fail_start: AtomicBool,
        hook_calls: AtomicUsize,
    }

    impl ProbeComponent {
        fn new(id: &str) -> Self {
            Self {
                id: id.to_string(),
                fail_start: AtomicBool::new(false),
                hook_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Component for ProbeComponent {
        fn id(&self) -> &str {
            &self.id
        }

        fn name(&self) -> &str {
            &self.id
        }

        async fn on_initialize(&self, _context: &ComponentContext) -> ComponentResult<()> {
            Ok(())
        }

        async fn on_start(&self) -> ComponentResult<()> {
            if self.fail_start.load(Ordering::SeqCst) {
                Err(ComponentError::failed("refusing to start"))
            } else {
                Ok(())
            }
        }

        async fn on_state_changed(&self, _old: LifecycleState, _new: LifecycleState) {
            self.hook_calls.fetch_add(1, Ordering::SeqCst);
        }

        async fn check_health(&self) -> HealthProbe {
            HealthProbe::healthy("all good")
        }
    }

    fn test_context() -> ComponentContext {
        use crate::bus::CommunicationBus;
        use crate::component::{ServiceMap, ShutdownSignal};
        use std::collections::HashMap;

        let signal = ShutdownSignal::new();
        ComponentContext::new(
            Arc::new(ServiceMap::new()),
            Arc::new(HashMap::new()),
            signal.token(),
            Arc::new(CommunicationBus::default()),
            std::sync::Weak::new(),
        )
    }

    #[tokio::test]
    async fn test_start_requires_initialized() {
        let harness = ComponentHarness::new(
            Arc::new(ProbeComponent::new("probe")),
            EventPublisher::default(),
        );

        let result = harness.start().await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("requires state 'initialized'"));
        assert_eq!(harness.state(), LifecycleState::Created);
    }

    #[tokio::test]
    async fn test_failure_moves_to_error_and_carries_cause() {
        let component = Arc::new(ProbeComponent::new("probe"));
        component.fail_start.store(true, Ordering::SeqCst);
        let harness = ComponentHarness::new(component, EventPublisher::default());

        assert!(harness.initialize(&test_context()).await.success);
        let result = harness.start().await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("refusing to start"));
        assert_eq!(harness.state(), LifecycleState::Error);
    }

    #[tokio::test]
    async fn test_hook_fires_on_every_transition() {
        let component = Arc::new(ProbeComponent::new("probe"));
        let harness = ComponentHarness::new(component.clone(), EventPublisher::default());

        harness.initialize(&test_context()).await;
        // Created -> Initializing -> Initialized
        assert_eq!(component.hook_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_shutdown_stops_running_component_first() {
        let harness = ComponentHarness::new(
            Arc::new(ProbeComponent::new("probe")),
            EventPublisher::default(),
        );
        harness.initialize(&test_context()).await;
        harness.start().await;
        assert_eq!(harness.state(), LifecycleState::Running);

        let result = harness.shutdown().await;
        assert!(result.success);
        assert_eq!(harness.state(), LifecycleState::Shutdown);
    }

    #[tokio::test]
    async fn test_dispose_is_idempotent_and_swallows_failures() {
        let component = Arc::new(ProbeComponent::new("probe"));
        let harness = ComponentHarness::new(component, EventPublisher::default());

        harness.dispose().await;
        assert_eq!(harness.state(), LifecycleState::Disposed);
        harness.dispose().await;
        assert_eq!(harness.state(), LifecycleState::Disposed);
    }

    #[tokio::test]
    async fn test_health_floors_on_lifecycle_state() {
        let component = Arc::new(ProbeComponent::new("probe"));
        component.fail_start.store(true, Ordering::SeqCst);
        let harness = ComponentHarness::new(component, EventPublisher::default());

        // Not running yet: probe says healthy, state says warning
        let health = harness.health().await;
        assert_eq!(health.state, HealthState::Warning);

        harness.initialize(&test_context()).await;
        harness.start().await;
        let health = harness.health().await;
        assert_eq!(health.state, HealthState::Critical);
        assert!(health.message.contains("error"));
    }
}
