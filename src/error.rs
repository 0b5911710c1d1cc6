use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ConductorError {
    LifecycleError(String),
    ResolutionError(String),
    BusError(String),
    RegistrationError(String),
    ConfigurationError(String),
}

impl fmt::Display for ConductorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConductorError::LifecycleError(msg) => write!(f, "Lifecycle error: {msg}"),
            ConductorError::ResolutionError(msg) => write!(f, "Resolution error: {msg}"),
            ConductorError::BusError(msg) => write!(f, "Bus error: {msg}"),
            ConductorError::RegistrationError(msg) => write!(f, "Registration error: {msg}"),
            ConductorError::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for ConductorError {}

pub type Result<T> = std::result::Result<T, ConductorError>;
