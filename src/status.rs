//! Session status machine: ready → listening → processing, with error as a
//! universal sink that reverts to ready. Watch channel for reactive
//! subscribers.

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

/// Status values surfaced to the display collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Ready,
    Listening,
    Processing,
    Error,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Ready => write!(f, "ready"),
            SessionStatus::Listening => write!(f, "listening"),
            SessionStatus::Processing => write!(f, "processing"),
            SessionStatus::Error => write!(f, "error"),
        }
    }
}

impl SessionStatus {
    /// Returns whether transitioning from `self` to `next` is valid.
    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        matches!(
            (self, next),
            (SessionStatus::Ready, SessionStatus::Listening)
                | (SessionStatus::Listening, SessionStatus::Processing)
                | (SessionStatus::Listening, SessionStatus::Ready)
                | (SessionStatus::Processing, SessionStatus::Listening)
                | (SessionStatus::Processing, SessionStatus::Ready)
                | (SessionStatus::Error, SessionStatus::Ready)
                // Any state can surface an error
                | (_, SessionStatus::Error)
        )
    }
}

/// Thread-safe status holder with watch subscribers.
pub struct StatusMachine {
    status: RwLock<SessionStatus>,
    status_tx: watch::Sender<SessionStatus>,
    status_rx: watch::Receiver<SessionStatus>,
}

impl StatusMachine {
    pub fn new() -> Self {
        let (status_tx, status_rx) = watch::channel(SessionStatus::Ready);
        Self {
            status: RwLock::new(SessionStatus::Ready),
            status_tx,
            status_rx,
        }
    }

    pub fn current(&self) -> SessionStatus {
        *self.status.read()
    }

    /// Attempt a transition. Returns the new status or the rejected pair.
    pub fn transition(&self, next: SessionStatus) -> Result<SessionStatus, String> {
        let mut status = self.status.write();
        let current = *status;
        if !current.can_transition_to(next) {
            let msg = format!("invalid status transition: {current} -> {next}");
            warn!("{msg}");
            return Err(msg);
        }
        *status = next;
        let _ = self.status_tx.send(next);
        info!(from = %current, to = %next, "status_transition");
        Ok(next)
    }

    /// Force back to ready from any state (session teardown, error revert).
    pub fn force_ready(&self) {
        let mut status = self.status.write();
        let prev = *status;
        *status = SessionStatus::Ready;
        let _ = self.status_tx.send(SessionStatus::Ready);
        info!(from = %prev, "status_forced_ready");
    }

    /// Subscribe to status changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status_rx.clone()
    }
}

impl Default for StatusMachine {
    fn default() -> Self {
        Self::new()
    }
}
