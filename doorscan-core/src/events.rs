//! Scan events fanned out to observers of a session.

use tokio::sync::broadcast;

use crate::constants::EVENT_CHANNEL_CAPACITY;
use crate::lifecycle::SessionState;
use crate::precheck::RejectReason;

/// Something a session did, for observers such as tests and audit logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// Lifecycle transition.
    StateChanged {
        /// Previous state.
        from: SessionState,
        /// New state.
        to: SessionState,
    },
    /// Committed: feedback fired and fields were populated.
    Accepted {
        /// Accepted code.
        code: String,
    },
    /// Repeat inside the duplicate window.
    Suppressed {
        /// Repeated code.
        code: String,
    },
    /// Refused by the precheck.
    Rejected {
        /// Refused code.
        code: String,
        /// Why the authority refused it.
        reason: RejectReason,
    },
}

/// In-process broadcast bus. Sending with no subscribers is fine.
#[derive(Debug, Clone)]
pub struct ScanEventBus {
    sender: broadcast::Sender<ScanEvent>,
}

impl Default for ScanEventBus {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }
}

impl ScanEventBus {
    /// New receiver for events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanEvent> {
        self.sender.subscribe()
    }

    /// Sends `event` to every current subscriber.
    pub fn publish(&self, event: ScanEvent) {
        let _ = self.sender.send(event);
    }
}
