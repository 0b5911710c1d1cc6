//! # Orchestration Error Types

use crate::error::ConductorError;
use crate::registry::RegistryError;
use crate::resolver::ResolutionError;
use thiserror::Error;

/// Errors raised by orchestrator operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrchestrationError {
    #[error("Registration rejected: {reason}")]
    RegistrationClosed { reason: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

impl OrchestrationError {
    pub fn registration_closed(reason: impl Into<String>) -> Self {
        Self::RegistrationClosed {
            reason: reason.into(),
        }
    }
}

impl From<OrchestrationError> for ConductorError {
    fn from(error: OrchestrationError) -> Self {
        match error {
            OrchestrationError::RegistrationClosed { .. } | OrchestrationError::Registry(_) => {
                ConductorError::RegistrationError(error.to_string())
            }
            OrchestrationError::Resolution(_) => ConductorError::ResolutionError(error.to_string()),
        }
    }
}

/// Result type alias for orchestration operations
pub type OrchestrationResult<T> = Result<T, OrchestrationError>;
