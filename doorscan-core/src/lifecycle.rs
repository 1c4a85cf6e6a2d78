//! Session states and the transition table between them.

use crate::error::{CameraFault, LifecycleError};

/// Where the scanner is in its camera lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Camera off.
    Idle,
    /// Camera start requested, not yet streaming.
    Starting,
    /// Streaming; frames are processed.
    Active,
    /// Stop requested, waiting for the camera.
    Stopping,
    /// Camera failed to start. A new start is allowed.
    Error(CameraFault),
}

impl SessionState {
    /// Frames are only processed while active.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// States from which a start request is honoured.
    pub fn can_start(&self) -> bool {
        matches!(self, Self::Idle | Self::Error(_))
    }

    /// The fault of an `Error` state.
    pub fn fault(&self) -> Option<&CameraFault> {
        match self {
            Self::Error(fault) => Some(fault),
            _ => None,
        }
    }

    /// Applies `event`, or reports the pair as an invalid transition.
    pub fn on(&self, event: &LifecycleEvent) -> Result<SessionState, LifecycleError> {
        use LifecycleEvent as E;
        use SessionState as S;

        let next = match (self, event) {
            (S::Idle | S::Error(_), E::StartRequested) => S::Starting,
            (S::Starting, E::CameraReady) => S::Active,
            (S::Starting, E::CameraFailed(fault)) => S::Error(fault.clone()),
            (S::Active, E::StopRequested) => S::Stopping,
            (S::Stopping, E::StopAcknowledged) => S::Idle,
            _ => {
                return Err(LifecycleError::InvalidTransition {
                    from: self.clone(),
                    event: event.clone(),
                });
            }
        };
        Ok(next)
    }
}

/// Input to [`SessionState::on`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// `start()` was called.
    StartRequested,
    /// The camera began streaming.
    CameraReady,
    /// The camera failed to start.
    CameraFailed(CameraFault),
    /// `stop()` was called.
    StopRequested,
    /// The camera stopped, or failed to and we gave up on it.
    StopAcknowledged,
}
