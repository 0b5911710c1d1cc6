//! # Lifecycle Transition Cell
//!
//! Per-component state cell enforcing the legal transition table. The
//! precondition check and the move into a phase's transient state are a single
//! atomic step under the cell's lock, so of two concurrent calls to the same
//! phase exactly one proceeds; the other observes the precondition refusal.
//!
//! The cell only moves state; invoking the component's `on_state_changed`
//! hook and publishing the state-change event belong to the harness driving
//! the phase (see `orchestration::harness`), which receives the committed
//! [`StateChanged`] record from every mutating call.

use super::events::{LifecyclePhase, StateChanged};
use super::states::LifecycleState;
use parking_lot::Mutex;
use tracing::debug;

/// Outcome of attempting to enter a phase
#[derive(Debug, Clone)]
pub enum PhaseAdmission {
    /// Precondition held; the transient state has been entered
    Proceed(StateChanged),
    /// Phase is a defined no-op from the current state (Stop when not
    /// running, Shutdown when already shut down)
    Skip { current: LifecycleState },
    /// Precondition failed; state unchanged
    Refused {
        current: LifecycleState,
        reason: String,
    },
}

/// Serialized lifecycle state for one component
#[derive(Debug)]
pub struct LifecycleCell {
    component_id: String,
    state: Mutex<LifecycleState>,
}

impl LifecycleCell {
    pub fn new(component_id: impl Into<String>) -> Self {
        Self {
            component_id: component_id.into(),
            state: Mutex::new(LifecycleState::Created),
        }
    }

    /// Current state of the component
    pub fn current(&self) -> LifecycleState {
        *self.state.lock()
    }

    /// Attempt to enter the given phase.
    ///
    /// On `Proceed` the cell has already moved into the phase's transient
    /// state and the caller must follow up with [`complete_phase`] or
    /// [`fail_phase`].
    ///
    /// [`complete_phase`]: Self::complete_phase
    /// [`fail_phase`]: Self::fail_phase
    pub fn begin_phase(&self, phase: LifecyclePhase) -> PhaseAdmission {
        let mut state = self.state.lock();
        let current = *state;

        if let Some(required) = phase.required_state() {
            if current != required {
                return PhaseAdmission::Refused {
                    current,
                    reason: format!(
                        "{} requires state '{required}', component '{}' is '{current}'",
                        phase.phase_name(),
                        self.component_id
                    ),
                };
            }
        } else {
            match phase {
                LifecyclePhase::Stop => {
                    if !current.is_active() {
                        return PhaseAdmission::Skip { current };
                    }
                }
                LifecyclePhase::Shutdown => {
                    if current.is_shut_down() {
                        return PhaseAdmission::Skip { current };
                    }
                    // Running components are stopped by the harness before
                    // shutdown reaches the cell; a transient state here means
                    // another phase call is in flight.
                    if current.is_active() || current.is_transient() {
                        return PhaseAdmission::Refused {
                            current,
                            reason: format!(
                                "shutdown cannot begin for component '{}' while '{current}'",
                                self.component_id
                            ),
                        };
                    }
                }
                _ => {}
            }
        }

        let transient = phase.transient_state();
        *state = transient;
        debug!(
            component_id = %self.component_id,
            phase = phase.phase_name(),
            from = %current,
            to = %transient,
            "lifecycle phase admitted"
        );
        PhaseAdmission::Proceed(StateChanged::new(&self.component_id, current, transient))
    }

    /// Commit the phase's success state. Must follow a `Proceed` admission.
    pub fn complete_phase(&self, phase: LifecyclePhase) -> StateChanged {
        let mut state = self.state.lock();
        let old = *state;
        debug_assert_eq!(old, phase.transient_state());
        let new = phase.success_state();
        *state = new;
        StateChanged::new(&self.component_id, old, new)
    }

    /// Move to the error state after a failed phase callback
    pub fn fail_phase(&self) -> StateChanged {
        let mut state = self.state.lock();
        let old = *state;
        *state = LifecycleState::Error;
        StateChanged::new(&self.component_id, old, LifecycleState::Error)
    }

    /// Mark the component disposed. Returns `None` when already disposed.
    pub fn mark_disposed(&self) -> Option<StateChanged> {
        let mut state = self.state.lock();
        let old = *state;
        if old == LifecycleState::Disposed {
            return None;
        }
        *state = LifecycleState::Disposed;
        Some(StateChanged::new(&self.component_id, old, LifecycleState::Disposed))
    }
}
