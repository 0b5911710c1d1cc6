#![allow(dead_code)]

//! Shared test components for the integration suites.

pub mod strategies;

use async_trait::async_trait;
use conductor_core::component::{
    Component, ComponentContext, ComponentError, ComponentResult, Driver, DriverKind,
};
use conductor_core::bus::{BusResult, ComponentMessage};
use conductor_core::priority::Priority;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Shared, ordered record of phase callbacks across all test components
#[derive(Clone, Default)]
pub struct PhaseLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl PhaseLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, phase: &str, component_id: &str) {
        self.entries
            .lock()
            .unwrap()
            .push(format!("{phase}:{component_id}"));
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    /// Position of the given entry, panicking when absent
    pub fn position(&self, entry: &str) -> usize {
        let entries = self.entries();
        entries
            .iter()
            .position(|e| e == entry)
            .unwrap_or_else(|| panic!("entry '{entry}' not in log {entries:?}"))
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.entries().iter().any(|e| e == entry)
    }
}

/// Configurable test component recording its phase callbacks
pub struct TestComponent {
    id: String,
    dependencies: Vec<String>,
    tags: Vec<String>,
    priority: Priority,
    fail_initialize: bool,
    fail_start: bool,
    init_delay: Option<Duration>,
    log: PhaseLog,
}

impl TestComponent {
    pub fn new(id: &str, log: PhaseLog) -> Self {
        Self {
            id: id.to_string(),
            dependencies: Vec::new(),
            tags: Vec::new(),
            priority: Priority::default(),
            fail_initialize: false,
            fail_start: false,
            init_delay: None,
            log,
        }
    }

    pub fn with_dependencies(mut self, dependencies: &[&str]) -> Self {
        self.dependencies = dependencies.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn failing_initialize(mut self) -> Self {
        self.fail_initialize = true;
        self
    }

    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub fn with_init_delay(mut self, delay: Duration) -> Self {
        self.init_delay = Some(delay);
        self
    }
}

#[async_trait]
impl Component for TestComponent {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.id
    }

    fn dependencies(&self) -> Vec<String> {
        self.dependencies.clone()
    }

    fn tags(&self) -> Vec<String> {
        self.tags.clone()
    }

    fn priority(&self) -> Priority {
        self.priority.clone()
    }

    async fn on_initialize(&self, _context: &ComponentContext) -> ComponentResult<()> {
        if let Some(delay) = self.init_delay {
            tokio::time::sleep(delay).await;
        }
        self.log.record("initialize", &self.id);
        if self.fail_initialize {
            return Err(ComponentError::failed("initialize failure injected"));
        }
        Ok(())
    }

    async fn on_start(&self) -> ComponentResult<()> {
        self.log.record("start", &self.id);
        if self.fail_start {
            return Err(ComponentError::failed("start failure injected"));
        }
        Ok(())
    }

    async fn on_stop(&self) -> ComponentResult<()> {
        self.log.record("stop", &self.id);
        Ok(())
    }

    async fn on_shutdown(&self) -> ComponentResult<()> {
        self.log.record("shutdown", &self.id);
        Ok(())
    }
}

/// Test driver: a component with a resource kind that echoes bus messages
pub struct TestDriver {
    inner: TestComponent,
    kind: DriverKind,
}

impl TestDriver {
    pub fn new(id: &str, kind: DriverKind, log: PhaseLog) -> Self {
        Self {
            inner: TestComponent::new(id, log),
            kind,
        }
    }

    pub fn with_dependencies(mut self, dependencies: &[&str]) -> Self {
        self.inner = self.inner.with_dependencies(dependencies);
        self
    }
}

#[async_trait]
impl Component for TestDriver {
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn dependencies(&self) -> Vec<String> {
        self.inner.dependencies()
    }

    async fn on_initialize(&self, context: &ComponentContext) -> ComponentResult<()> {
        self.inner.on_initialize(context).await
    }

    async fn on_start(&self) -> ComponentResult<()> {
        self.inner.on_start().await
    }

    async fn on_stop(&self) -> ComponentResult<()> {
        self.inner.on_stop().await
    }

    async fn on_shutdown(&self) -> ComponentResult<()> {
        self.inner.on_shutdown().await
    }

    async fn handle_message(
        &self,
        message: ComponentMessage,
    ) -> BusResult<Option<ComponentMessage>> {
        Ok(Some(ComponentMessage::response_to(
            &message,
            self.id(),
            message.payload.clone(),
        )))
    }
}

impl Driver for TestDriver {
    fn kind(&self) -> DriverKind {
        self.kind.clone()
    }
}
