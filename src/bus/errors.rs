//! # Bus Error Types
//!
//! Errors internal to message delivery. Handler and endpoint failures never
//! cross the bus boundary as errors; the bus converts them into correlated
//! error response messages.

use thiserror::Error;

/// Errors raised by bus operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BusError {
    #[error("Handler failed for '{component_id}' ({message_type}): {message}")]
    HandlerFailed {
        component_id: String,
        message_type: String,
        message: String,
    },

    #[error("Invalid target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("Internal bus error: {message}")]
    Internal { message: String },
}

impl BusError {
    /// Create a handler failure error
    pub fn handler_failed(
        component_id: impl Into<String>,
        message_type: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::HandlerFailed {
            component_id: component_id.into(),
            message_type: message_type.into(),
            message: message.into(),
        }
    }

    /// Create an invalid target error
    pub fn invalid_target(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTarget {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<String> for BusError {
    fn from(message: String) -> Self {
        Self::internal(message)
    }
}

/// Result type alias for bus operations
pub type BusResult<T> = Result<T, BusError>;
