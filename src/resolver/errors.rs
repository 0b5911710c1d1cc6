//! # Resolution Error Types
//!
//! Dependency errors are fatal to a resolution attempt and surface before any
//! component's lifecycle is touched.

use thiserror::Error;

/// Errors raised while resolving initialization order
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolutionError {
    #[error("Component '{component_id}' declares missing dependency '{dependency}'")]
    MissingDependency {
        component_id: String,
        dependency: String,
    },

    #[error("Dependency cycle detected: {cycle}")]
    CycleDetected { cycle: String },

    #[error("Duplicate component identifier '{component_id}'")]
    DuplicateId { component_id: String },
}

impl ResolutionError {
    pub fn missing_dependency(
        component_id: impl Into<String>,
        dependency: impl Into<String>,
    ) -> Self {
        Self::MissingDependency {
            component_id: component_id.into(),
            dependency: dependency.into(),
        }
    }

    pub fn cycle(path: &[String]) -> Self {
        Self::CycleDetected {
            cycle: path.join(" -> "),
        }
    }
}

/// Result type alias for resolution operations
pub type ResolutionResult<T> = Result<T, ResolutionError>;
