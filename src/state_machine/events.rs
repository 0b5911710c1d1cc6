use super::states::LifecycleState;
use serde::{Deserialize, Serialize};

/// The four phase operations every component exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
    Initialize,
    Start,
    Stop,
    Shutdown,
}

impl LifecyclePhase {
    /// String representation of the phase for logging
    pub fn phase_name(&self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Shutdown => "shutdown",
        }
    }

    /// State a component must be in for this phase to be admitted.
    ///
    /// Stop and Shutdown have no strict precondition; they degrade to no-op
    /// successes instead (see [`super::LifecycleCell::begin_phase`]).
    pub fn required_state(&self) -> Option<LifecycleState> {
        match self {
            Self::Initialize => Some(LifecycleState::Created),
            Self::Start => Some(LifecycleState::Initialized),
            Self::Stop | Self::Shutdown => None,
        }
    }

    /// Transient state entered while the phase callback runs
    pub fn transient_state(&self) -> LifecycleState {
        match self {
            Self::Initialize => LifecycleState::Initializing,
            Self::Start => LifecycleState::Starting,
            Self::Stop => LifecycleState::Stopping,
            Self::Shutdown => LifecycleState::ShuttingDown,
        }
    }

    /// State reached when the phase callback succeeds
    pub fn success_state(&self) -> LifecycleState {
        match self {
            Self::Initialize => LifecycleState::Initialized,
            Self::Start => LifecycleState::Running,
            Self::Stop => LifecycleState::Stopped,
            Self::Shutdown => LifecycleState::Shutdown,
        }
    }
}

impl std::fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.phase_name())
    }
}

/// A committed state transition, carried on the hook and the event stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateChanged {
    pub component_id: String,
    pub old_state: LifecycleState,
    pub new_state: LifecycleState,
    pub changed_at: chrono::DateTime<chrono::Utc>,
}

impl StateChanged {
    pub fn new(component_id: impl Into<String>, old: LifecycleState, new: LifecycleState) -> Self {
        Self {
            component_id: component_id.into(),
            old_state: old,
            new_state: new,
            changed_at: chrono::Utc::now(),
        }
    }
}
