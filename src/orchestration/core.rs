//! # Orchestrator Core
//!
//! Owns the component collection, the bus, and the registry; drives every
//! component through the lifecycle state machine in resolver order (forward
//! for initialize/start, reverse of the last successful forward order for
//! stop/shutdown) and aggregates per-component results, health, and
//! diagnostics.
//!
//! The engine itself runs on the same lifecycle cell as its components:
//! registration is only open while the engine is Created, and engine state
//! changes are published on the event stream alongside component ones.

use crate::component::{
    AggregateResult, Component, ComponentContext, Driver, EngineDiagnostics, EngineHealth,
    OperationResult, ServiceMap, ShutdownSignal,
};
use crate::config::ConductorConfig;
use crate::bus::CommunicationBus;
use crate::events::{EventPublisher, OrchestratorEvent};
use crate::orchestration::errors::{OrchestrationError, OrchestrationResult};
use crate::orchestration::harness::ComponentHarness;
use crate::registry::{ComponentEndpoint, ComponentRegistry};
use crate::resolver::{ComponentSnapshot, DependencyResolver, ResolutionError};
use crate::state_machine::{
    LifecycleCell, LifecyclePhase, LifecycleState, PhaseAdmission, StateChanged,
};
use chrono::Utc;
use futures::future::join_all;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Instant;
use tracing::{info, warn};

/// Identifier the engine's own lifecycle cell reports in state-change events
pub const ENGINE_ID: &str = "engine";

#[derive(Debug, Clone)]
struct ResolvedPlan {
    order: Vec<String>,
    levels: Vec<Vec<String>>,
}

/// The orchestration engine
pub struct Orchestrator {
    config: ConductorConfig,
    registry: Arc<ComponentRegistry>,
    bus: Arc<CommunicationBus>,
    events: EventPublisher,
    cell: LifecycleCell,
    harnesses: RwLock<HashMap<String, Arc<ComponentHarness>>>,
    plan: RwLock<Option<ResolvedPlan>>,
    services: RwLock<ServiceMap>,
    settings: RwLock<HashMap<String, serde_json::Value>>,
    execution_context: RwLock<Option<String>>,
    shutdown_signal: ShutdownSignal,
    self_ref: Weak<Orchestrator>,
}

impl Orchestrator {
    /// Create an engine over the given registry
    pub fn new(config: ConductorConfig, registry: Arc<ComponentRegistry>) -> Arc<Self> {
        let bus = Arc::new(CommunicationBus::new(config.bus_timeout()));
        let events = EventPublisher::new(config.events.channel_capacity);
        Arc::new_cyclic(|self_ref| Self {
            config,
            registry,
            bus,
            events,
            cell: LifecycleCell::new(ENGINE_ID),
            harnesses: RwLock::new(HashMap::new()),
            plan: RwLock::new(None),
            services: RwLock::new(ServiceMap::new()),
            settings: RwLock::new(HashMap::new()),
            execution_context: RwLock::new(None),
            shutdown_signal: ShutdownSignal::new(),
            self_ref: self_ref.clone(),
        })
    }

    pub fn bus(&self) -> &Arc<CommunicationBus> {
        &self.bus
    }

    pub fn events(&self) -> &EventPublisher {
        &self.events
    }

    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    /// Current engine lifecycle state
    pub fn state(&self) -> LifecycleState {
        self.cell.current()
    }

    /// Lifecycle state of a single managed component
    pub fn component_state(&self, component_id: &str) -> Option<LifecycleState> {
        self.harnesses
            .read()
            .get(component_id)
            .map(|harness| harness.state())
    }

    /// The forward order of the last successful resolution
    pub fn startup_order(&self) -> Option<Vec<String>> {
        self.plan.read().as_ref().map(|plan| plan.order.clone())
    }

    /// The level partition of the last successful resolution
    pub fn startup_levels(&self) -> Option<Vec<Vec<String>>> {
        self.plan.read().as_ref().map(|plan| plan.levels.clone())
    }

    /// Register a module. Only permitted while the engine is Created.
    pub fn register_component(
        &self,
        component: Arc<dyn Component>,
    ) -> OrchestrationResult<()> {
        self.ensure_registration_open()?;
        self.registry.register_module(component)?;
        Ok(())
    }

    /// Register a driver. Only permitted while the engine is Created.
    pub fn register_driver<D: Driver + 'static>(&self, driver: Arc<D>) -> OrchestrationResult<()> {
        self.ensure_registration_open()?;
        self.registry.register_driver(driver)?;
        Ok(())
    }

    /// Register a component factory, instantiated at initialize time
    pub fn register_factory<F>(
        &self,
        kind: Option<crate::component::DriverKind>,
        factory: F,
    ) -> OrchestrationResult<()>
    where
        F: Fn() -> Arc<dyn Component> + Send + Sync + 'static,
    {
        self.ensure_registration_open()?;
        self.registry.register_factory(kind, factory);
        Ok(())
    }

    /// Expose a service to components via the context's typed lookup
    pub fn provide_service<T: std::any::Any + Send + Sync>(
        &self,
        service: Arc<T>,
    ) -> OrchestrationResult<()> {
        self.ensure_registration_open()?;
        self.services.write().insert(service);
        Ok(())
    }

    /// Add a read-only configuration value visible to components
    pub fn set_setting(
        &self,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> OrchestrationResult<()> {
        self.ensure_registration_open()?;
        self.settings.write().insert(key.into(), value);
        Ok(())
    }

    /// Name the execution context applied to priority ranking
    /// (e.g. "Production")
    pub fn set_execution_context(&self, context: impl Into<String>) -> OrchestrationResult<()> {
        self.ensure_registration_open()?;
        *self.execution_context.write() = Some(context.into());
        Ok(())
    }

    /// Initialize all components in dependency order
    pub async fn initialize(&self) -> AggregateResult {
        let started = Instant::now();
        let change = match self.cell.begin_phase(LifecyclePhase::Initialize) {
            PhaseAdmission::Proceed(change) => change,
            PhaseAdmission::Skip { current } => {
                return AggregateResult::skipped("initialize", current.to_string(), started.elapsed())
            }
            PhaseAdmission::Refused { reason, .. } => {
                return AggregateResult::aborted("initialize", reason, started.elapsed())
            }
        };
        self.commit_engine(change);

        if let Err(error) = self.registry.materialize() {
            return self.fail_engine_operation("initialize", error.to_string(), started);
        }
        self.ensure_harnesses();

        let plan = match self.resolve_plan() {
            Ok(plan) => plan,
            Err(error) => {
                return self.fail_engine_operation("initialize", error.to_string(), started)
            }
        };
        info!(
            order = ?plan.order,
            levels = plan.levels.len(),
            "Resolved startup plan"
        );
        *self.plan.write() = Some(plan.clone());

        let context = self.component_context();
        let results = self
            .drive_forward(LifecyclePhase::Initialize, Some(context), &plan)
            .await;
        self.finish_engine_phase(LifecyclePhase::Initialize, "initialize", results, started)
    }

    /// Start all components in the stored forward order
    pub async fn start(&self) -> AggregateResult {
        let started = Instant::now();
        let change = match self.cell.begin_phase(LifecyclePhase::Start) {
            PhaseAdmission::Proceed(change) => change,
            PhaseAdmission::Skip { current } => {
                return AggregateResult::skipped("start", current.to_string(), started.elapsed())
            }
            PhaseAdmission::Refused { reason, .. } => {
                return AggregateResult::aborted("start", reason, started.elapsed())
            }
        };
        self.commit_engine(change);

        let plan = self.plan.read().clone();
        let Some(plan) = plan else {
            return self.fail_engine_operation("start", "no resolved startup plan", started);
        };
        let results = self.drive_forward(LifecyclePhase::Start, None, &plan).await;
        self.finish_engine_phase(LifecyclePhase::Start, "start", results, started)
    }

    /// Stop all components, last-initialized first
    pub async fn stop(&self) -> AggregateResult {
        let started = Instant::now();
        let change = match self.cell.begin_phase(LifecyclePhase::Stop) {
            PhaseAdmission::Proceed(change) => change,
            PhaseAdmission::Skip { current } => {
                return AggregateResult::skipped("stop", format!("engine is '{current}'"), started.elapsed())
            }
            PhaseAdmission::Refused { reason, .. } => {
                return AggregateResult::aborted("stop", reason, started.elapsed())
            }
        };
        self.commit_engine(change);
        self.shutdown_signal.trigger();

        let order = match self.teardown_order() {
            Ok(order) => order,
            Err(error) => return self.fail_engine_operation("stop", error.to_string(), started),
        };
        let results = self.drive_teardown(LifecyclePhase::Stop, &order).await;
        self.finish_engine_phase(LifecyclePhase::Stop, "stop", results, started)
    }

    /// Shut all components down, last-initialized first. Idempotent; stops
    /// the engine first when running.
    pub async fn shutdown(&self) -> AggregateResult {
        let started = Instant::now();
        if self.cell.current().is_active() {
            let stopped = self.stop().await;
            if !stopped.success {
                warn!(
                    message = %stopped.message,
                    "Stop before engine shutdown failed, continuing teardown"
                );
            }
        }

        let change = match self.cell.begin_phase(LifecyclePhase::Shutdown) {
            PhaseAdmission::Proceed(change) => change,
            PhaseAdmission::Skip { current } => {
                return AggregateResult::skipped(
                    "shutdown",
                    format!("engine is '{current}'"),
                    started.elapsed(),
                )
            }
            PhaseAdmission::Refused { reason, .. } => {
                return AggregateResult::aborted("shutdown", reason, started.elapsed())
            }
        };
        self.commit_engine(change);
        self.shutdown_signal.trigger();
        self.ensure_harnesses();

        let order = match self.teardown_order() {
            Ok(order) => order,
            Err(error) => {
                return self.fail_engine_operation("shutdown", error.to_string(), started)
            }
        };
        let results = self.drive_teardown(LifecyclePhase::Shutdown, &order).await;
        self.finish_engine_phase(LifecyclePhase::Shutdown, "shutdown", results, started)
    }

    /// Release the engine and every component. Attempts a graceful shutdown
    /// first, swallowing and logging failures; idempotent.
    pub async fn dispose(&self) {
        if self.cell.current() == LifecycleState::Disposed {
            return;
        }
        if !self.cell.current().is_shut_down() {
            let result = self.shutdown().await;
            if !result.success {
                warn!(
                    message = %result.message,
                    "Shutdown during engine disposal failed, disposing anyway"
                );
            }
        }

        let harnesses: Vec<Arc<ComponentHarness>> =
            self.harnesses.read().values().cloned().collect();
        for harness in harnesses {
            harness.dispose().await;
        }

        if let Some(change) = self.cell.mark_disposed() {
            self.commit_engine(change);
        }
    }

    /// Aggregated health snapshot: worst component status wins
    pub async fn health(&self) -> EngineHealth {
        self.ensure_harnesses();
        let harnesses: Vec<Arc<ComponentHarness>> =
            self.harnesses.read().values().cloned().collect();
        let probes = join_all(harnesses.iter().map(|harness| harness.health())).await;

        let components = harnesses
            .iter()
            .map(|harness| harness.id().to_string())
            .zip(probes)
            .collect();
        EngineHealth::aggregate(components)
    }

    /// Per-component diagnostics snapshot
    pub fn diagnostics(&self) -> EngineDiagnostics {
        self.ensure_harnesses();
        let context = self.execution_context.read().clone();
        let components = self
            .harnesses
            .read()
            .values()
            .map(|harness| {
                (
                    harness.id().to_string(),
                    harness.diagnostics(context.as_deref()),
                )
            })
            .collect();
        EngineDiagnostics {
            engine_state: self.cell.current(),
            components,
            captured_at: Utc::now(),
        }
    }

    fn ensure_registration_open(&self) -> OrchestrationResult<()> {
        let state = self.cell.current();
        if state == LifecycleState::Created {
            Ok(())
        } else {
            Err(OrchestrationError::registration_closed(format!(
                "engine is '{state}', components must be registered before startup"
            )))
        }
    }

    fn ensure_harnesses(&self) {
        let mut harnesses = self.harnesses.write();
        for entry in self.registry.components() {
            harnesses
                .entry(entry.component.id().to_string())
                .or_insert_with(|| {
                    Arc::new(
                        ComponentHarness::new(entry.component.clone(), self.events.clone())
                            .with_phase_timeout(self.config.phase_timeout()),
                    )
                });
        }
    }

    fn harness(&self, component_id: &str) -> Option<Arc<ComponentHarness>> {
        self.harnesses.read().get(component_id).cloned()
    }

    fn snapshots(&self) -> Vec<ComponentSnapshot> {
        self.registry
            .components()
            .iter()
            .map(|entry| ComponentSnapshot::from_component(entry.component.as_ref()))
            .collect()
    }

    fn resolve_plan(&self) -> Result<ResolvedPlan, ResolutionError> {
        let snapshots = self.snapshots();
        let resolver = match self.execution_context.read().as_deref() {
            Some(context) => DependencyResolver::with_context(context),
            None => DependencyResolver::new(),
        };
        let order = resolver.resolve_order(&snapshots)?;
        let levels = resolver.resolve_levels(&snapshots)?;
        Ok(ResolvedPlan { order, levels })
    }

    fn teardown_order(&self) -> Result<Vec<String>, ResolutionError> {
        if let Some(plan) = self.plan.read().as_ref() {
            return Ok(DependencyResolver::reverse_order(&plan.order));
        }
        let plan = self.resolve_plan()?;
        Ok(DependencyResolver::reverse_order(&plan.order))
    }

    fn component_context(&self) -> ComponentContext {
        ComponentContext::new(
            Arc::new(self.services.read().clone()),
            Arc::new(self.settings.read().clone()),
            self.shutdown_signal.token(),
            self.bus.clone(),
            self.self_ref.clone(),
        )
    }

    async fn drive_forward(
        &self,
        phase: LifecyclePhase,
        context: Option<ComponentContext>,
        plan: &ResolvedPlan,
    ) -> HashMap<String, OperationResult> {
        if self.config.execution.parallel_startup {
            self.drive_levels(phase, context, &plan.levels).await
        } else {
            self.drive_sequence(phase, context, &plan.order).await
        }
    }

    /// Run one dependency level at a time; components within a level run
    /// concurrently. With halt-on-failure configured, a failing level stops
    /// subsequent levels from starting.
    async fn drive_levels(
        &self,
        phase: LifecyclePhase,
        context: Option<ComponentContext>,
        levels: &[Vec<String>],
    ) -> HashMap<String, OperationResult> {
        let mut results = HashMap::new();
        for level in levels {
            let tasks = level.iter().filter_map(|id| self.harness(id)).map(|harness| {
                let context = context.clone();
                async move {
                    let result = Self::run_phase(&harness, phase, context.as_ref()).await;
                    (harness.id().to_string(), result)
                }
            });
            let level_results = join_all(tasks).await;

            let mut level_failed = false;
            for (id, result) in level_results {
                if result.success {
                    self.after_phase_success(phase, &id);
                } else {
                    level_failed = true;
                }
                results.insert(id, result);
            }
            if level_failed && !self.config.execution.continue_on_failure {
                break;
            }
        }
        results
    }

    async fn drive_sequence(
        &self,
        phase: LifecyclePhase,
        context: Option<ComponentContext>,
        order: &[String],
    ) -> HashMap<String, OperationResult> {
        let mut results = HashMap::new();
        for id in order {
            let Some(harness) = self.harness(id) else {
                continue;
            };
            let result = Self::run_phase(&harness, phase, context.as_ref()).await;
            let failed = !result.success;
            if !failed {
                self.after_phase_success(phase, id);
            }
            results.insert(id.clone(), result);
            if failed && !self.config.execution.continue_on_failure {
                break;
            }
        }
        results
    }

    /// Teardown visits every component regardless of individual failures;
    /// containment is per component and the aggregate reports the outcome.
    async fn drive_teardown(
        &self,
        phase: LifecyclePhase,
        order: &[String],
    ) -> HashMap<String, OperationResult> {
        let mut results = HashMap::new();
        for id in order {
            let Some(harness) = self.harness(id) else {
                continue;
            };
            let result = Self::run_phase(&harness, phase, None).await;
            if result.success {
                self.after_phase_success(phase, id);
            }
            results.insert(id.clone(), result);
        }
        results
    }

    async fn run_phase(
        harness: &ComponentHarness,
        phase: LifecyclePhase,
        context: Option<&ComponentContext>,
    ) -> OperationResult {
        match phase {
            LifecyclePhase::Initialize => {
                let context = context.expect("initialize requires a component context");
                harness.initialize(context).await
            }
            LifecyclePhase::Start => harness.start().await,
            LifecyclePhase::Stop => harness.stop().await,
            LifecyclePhase::Shutdown => harness.shutdown().await,
        }
    }

    /// Bus wiring tied to phase outcomes: drivers become reachable once
    /// initialized and unreachable once shut down.
    fn after_phase_success(&self, phase: LifecyclePhase, component_id: &str) {
        match phase {
            LifecyclePhase::Initialize => {
                if let Some(entry) = self.registry.get(component_id) {
                    if let Some(kind) = entry.kind.clone() {
                        self.bus.register(
                            component_id,
                            Some(kind.clone()),
                            Arc::new(ComponentEndpoint(entry.component.clone())),
                        );
                        self.events.publish(OrchestratorEvent::DriverRegistered {
                            component_id: component_id.to_string(),
                            kind,
                            registered_at: Utc::now(),
                        });
                    }
                }
            }
            LifecyclePhase::Shutdown => {
                if let Some(entry) = self.registry.get(component_id) {
                    if let Some(kind) = entry.kind.clone() {
                        if self.bus.unregister(component_id) {
                            self.events.publish(OrchestratorEvent::DriverUnregistered {
                                component_id: component_id.to_string(),
                                kind,
                                unregistered_at: Utc::now(),
                            });
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn fail_engine_operation(
        &self,
        operation: &str,
        error: impl Into<String>,
        started: Instant,
    ) -> AggregateResult {
        let change = self.cell.fail_phase();
        self.commit_engine(change);
        AggregateResult::aborted(operation, error, started.elapsed())
    }

    fn finish_engine_phase(
        &self,
        phase: LifecyclePhase,
        operation: &str,
        results: HashMap<String, OperationResult>,
        started: Instant,
    ) -> AggregateResult {
        let aggregate = AggregateResult::aggregate(
            operation,
            results,
            self.config.execution.continue_on_failure,
            started.elapsed(),
        );
        let change = if aggregate.success {
            self.cell.complete_phase(phase)
        } else {
            self.cell.fail_phase()
        };
        self.commit_engine(change);
        info!(
            operation = operation,
            success = aggregate.success,
            duration_ms = aggregate.duration.as_millis() as u64,
            "Engine operation finished"
        );
        aggregate
    }

    fn commit_engine(&self, change: StateChanged) {
        self.events
            .publish(OrchestratorEvent::EngineStateChanged(change));
    }
}
