//! # Operation Results
//!
//! Result values returned by lifecycle phase operations. Precondition
//! violations and component failures are reported through these, never
//! through panics (wrong-state calls are expected outcomes).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Result of a single component phase operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult {
    pub success: bool,
    pub message: String,
    /// Failure cause, present only on failed results
    pub error: Option<String>,
    pub duration: Duration,
    pub completed_at: DateTime<Utc>,
}

impl OperationResult {
    /// Create a successful result
    pub fn success(message: impl Into<String>, duration: Duration) -> Self {
        Self {
            success: true,
            message: message.into(),
            error: None,
            duration,
            completed_at: Utc::now(),
        }
    }

    /// Create a failed result carrying its cause
    pub fn failure(
        message: impl Into<String>,
        error: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: Some(error.into()),
            duration,
            completed_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

/// Aggregate result of an engine-level operation across all components
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateResult {
    pub success: bool,
    pub message: String,
    pub duration: Duration,
    /// Individual results keyed by component identifier
    pub component_results: HashMap<String, OperationResult>,
}

impl AggregateResult {
    /// Aggregate per-component results for the named operation.
    ///
    /// The overall result fails only when a component failed and failures are
    /// not tolerated by configuration.
    pub fn aggregate(
        operation: &str,
        component_results: HashMap<String, OperationResult>,
        tolerate_failures: bool,
        duration: Duration,
    ) -> Self {
        let failed: Vec<&str> = component_results
            .iter()
            .filter(|(_, result)| !result.success)
            .map(|(id, _)| id.as_str())
            .collect();

        let success = failed.is_empty() || tolerate_failures;
        let message = if failed.is_empty() {
            format!(
                "{operation} completed for {} component(s)",
                component_results.len()
            )
        } else if tolerate_failures {
            format!(
                "{operation} completed with {} tolerated failure(s): {}",
                failed.len(),
                failed.join(", ")
            )
        } else {
            format!("{operation} failed for: {}", failed.join(", "))
        };

        Self {
            success,
            message,
            duration,
            component_results,
        }
    }

    /// Create an aggregate failure that never reached any component
    /// (e.g. a resolution error)
    pub fn aborted(operation: &str, error: impl Into<String>, duration: Duration) -> Self {
        Self {
            success: false,
            message: format!("{operation} aborted: {}", error.into()),
            duration,
            component_results: HashMap::new(),
        }
    }

    /// Create a no-op success for an operation that applies to no component
    /// from the current state
    pub fn skipped(operation: &str, reason: impl Into<String>, duration: Duration) -> Self {
        Self {
            success: true,
            message: format!("{operation} skipped: {}", reason.into()),
            duration,
            component_results: HashMap::new(),
        }
    }

    /// Identifiers of components whose individual result failed
    pub fn failed_components(&self) -> Vec<&str> {
        self.component_results
            .iter()
            .filter(|(_, result)| !result.success)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}
