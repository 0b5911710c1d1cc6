use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle states shared by components and the engine itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Initial state after construction
    Created,
    /// Initialize phase in progress
    Initializing,
    /// Initialize phase completed
    Initialized,
    /// Start phase in progress
    Starting,
    /// Component is running
    Running,
    /// Stop phase in progress
    Stopping,
    /// Component has been stopped
    Stopped,
    /// Shutdown phase in progress
    ShuttingDown,
    /// Component has shut down
    Shutdown,
    /// A phase operation failed; requires an external reset to leave
    Error,
    /// Component resources have been released
    Disposed,
}

impl LifecycleState {
    /// Check if a phase operation is currently in flight
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Initializing | Self::Starting | Self::Stopping | Self::ShuttingDown
        )
    }

    /// Check if the component is actively running
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Check if the component has been torn down
    pub fn is_shut_down(&self) -> bool {
        matches!(self, Self::Shutdown | Self::Disposed)
    }

    /// Check if this is the error state
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }

    /// Check if no further phase operations are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Disposed)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Initializing => write!(f, "initializing"),
            Self::Initialized => write!(f, "initialized"),
            Self::Starting => write!(f, "starting"),
            Self::Running => write!(f, "running"),
            Self::Stopping => write!(f, "stopping"),
            Self::Stopped => write!(f, "stopped"),
            Self::ShuttingDown => write!(f, "shutting_down"),
            Self::Shutdown => write!(f, "shutdown"),
            Self::Error => write!(f, "error"),
            Self::Disposed => write!(f, "disposed"),
        }
    }
}

impl std::str::FromStr for LifecycleState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "initializing" => Ok(Self::Initializing),
            "initialized" => Ok(Self::Initialized),
            "starting" => Ok(Self::Starting),
            "running" => Ok(Self::Running),
            "stopping" => Ok(Self::Stopping),
            "stopped" => Ok(Self::Stopped),
            "shutting_down" => Ok(Self::ShuttingDown),
            "shutdown" => Ok(Self::Shutdown),
            "error" => Ok(Self::Error),
            "disposed" => Ok(Self::Disposed),
            _ => Err(format!("Invalid lifecycle state: {s}")),
        }
    }
}

impl Default for LifecycleState {
    fn default() -> Self {
        Self::Created
    }
}
