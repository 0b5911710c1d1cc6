//! # Health and Diagnostics Types
//!
//! Structured snapshots surfaced by the orchestrator's health and diagnostics
//! queries. Aggregate status is the worst of all component statuses.

use crate::state_machine::LifecycleState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Component health status, ordered by severity
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    #[default]
    Healthy,
    Warning,
    Unhealthy,
    Critical,
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Warning => write!(f, "warning"),
            Self::Unhealthy => write!(f, "unhealthy"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// Component-reported health probe, before the harness adds timing and
/// lifecycle-state context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthProbe {
    pub state: HealthState,
    pub message: String,
}

impl HealthProbe {
    pub fn healthy(message: impl Into<String>) -> Self {
        Self {
            state: HealthState::Healthy,
            message: message.into(),
        }
    }

    pub fn degraded(state: HealthState, message: impl Into<String>) -> Self {
        Self {
            state,
            message: message.into(),
        }
    }
}

impl Default for HealthProbe {
    fn default() -> Self {
        Self::healthy("ok")
    }
}

/// Health snapshot for a single component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub state: HealthState,
    pub message: String,
    pub response_time: Duration,
    pub checked_at: DateTime<Utc>,
}

/// Count of components per health status
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthBreakdown {
    pub healthy: usize,
    pub warning: usize,
    pub unhealthy: usize,
    pub critical: usize,
}

impl HealthBreakdown {
    pub fn record(&mut self, state: HealthState) {
        match state {
            HealthState::Healthy => self.healthy += 1,
            HealthState::Warning => self.warning += 1,
            HealthState::Unhealthy => self.unhealthy += 1,
            HealthState::Critical => self.critical += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.healthy + self.warning + self.unhealthy + self.critical
    }
}

/// Aggregated engine health: worst component status wins
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineHealth {
    pub state: HealthState,
    pub components: HashMap<String, ComponentHealth>,
    pub breakdown: HealthBreakdown,
    pub checked_at: DateTime<Utc>,
}

impl EngineHealth {
    pub fn aggregate(components: HashMap<String, ComponentHealth>) -> Self {
        let mut breakdown = HealthBreakdown::default();
        let mut worst = HealthState::Healthy;
        for health in components.values() {
            breakdown.record(health.state);
            worst = worst.max(health.state);
        }
        Self {
            state: worst,
            components,
            breakdown,
            checked_at: Utc::now(),
        }
    }
}

/// Diagnostics snapshot for a single component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentDiagnostics {
    pub id: String,
    pub name: String,
    pub version: String,
    pub state: LifecycleState,
    pub dependencies: Vec<String>,
    pub effective_rank: u16,
    /// Component-specific details, opaque to the engine
    pub details: serde_json::Value,
}

/// Diagnostics snapshot across the whole engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineDiagnostics {
    pub engine_state: LifecycleState,
    pub components: HashMap<String, ComponentDiagnostics>,
    pub captured_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn health(state: HealthState) -> ComponentHealth {
        ComponentHealth {
            state,
            message: state.to_string(),
            response_time: Duration::from_millis(1),
            checked_at: Utc::now(),
        }
    }

    #[test]
    fn test_severity_ordering() {
        assert!(HealthState::Healthy < HealthState::Warning);
        assert!(HealthState::Warning < HealthState::Unhealthy);
        assert!(HealthState::Unhealthy < HealthState::Critical);
    }

    #[test]
    fn test_worst_status_wins() {
        let mut components = HashMap::new();
        components.insert("a".to_string(), health(HealthState::Healthy));
        components.insert("b".to_string(), health(HealthState::Warning));
        components.insert("c".to_string(), health(HealthState::Healthy));

        let engine = EngineHealth::aggregate(components);
        assert_eq!(engine.state, HealthState::Warning);
        assert_eq!(engine.breakdown.healthy, 2);
        assert_eq!(engine.breakdown.warning, 1);
        assert_eq!(engine.breakdown.total(), 3);
    }

    #[test]
    fn test_empty_engine_is_healthy() {
        let engine = EngineHealth::aggregate(HashMap::new());
        assert_eq!(engine.state, HealthState::Healthy);
        assert_eq!(engine.breakdown.total(), 0);
    }
}
