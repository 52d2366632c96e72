//! Recognizer collaborator contract: transcript snapshots, the error
//! taxonomy, and the auto-restart rule. The acoustic engine itself lives
//! outside this crate; it feeds snapshots and errors into a [`crate::session::Session`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Delay before auto-restarting a continuous recognizer after a transient end.
pub const RESTART_DELAY: Duration = Duration::from_millis(100);

/// One recognizer callback's view of the transcript.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptSnapshot {
    /// Accumulated final text. Grows monotonically within a session.
    pub final_text: String,
    /// Tentative hypothesis, replaced wholesale on each update.
    pub interim_text: String,
    /// True when this callback carried newly finalized text.
    pub is_final_event: bool,
}

impl TranscriptSnapshot {
    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            final_text: String::new(),
            interim_text: text.into(),
            is_final_event: false,
        }
    }

    pub fn finalized(final_text: impl Into<String>) -> Self {
        Self {
            final_text: final_text.into(),
            interim_text: String::new(),
            is_final_event: true,
        }
    }
}

/// Recognizer failure classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind", content = "detail")]
pub enum RecognizerError {
    NoSpeech,
    AudioCapture,
    PermissionDenied,
    Network,
    Aborted,
    Other(String),
}

impl RecognizerError {
    /// Permanent errors must not trigger an auto-restart: retrying will not
    /// make a denied microphone appear.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            RecognizerError::PermissionDenied | RecognizerError::AudioCapture
        )
    }

    /// Human-readable message surfaced in the status display.
    pub fn user_message(&self) -> String {
        match self {
            RecognizerError::NoSpeech => "No speech detected. Please try again.".to_string(),
            RecognizerError::AudioCapture => {
                "No microphone found. Please check your microphone.".to_string()
            }
            RecognizerError::PermissionDenied => {
                "Microphone access denied. Please allow microphone access.".to_string()
            }
            RecognizerError::Network => {
                "Network error. Please check your internet connection.".to_string()
            }
            RecognizerError::Aborted => "Speech recognition aborted.".to_string(),
            RecognizerError::Other(detail) => format!("Error: {detail}"),
        }
    }
}

impl std::fmt::Display for RecognizerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for RecognizerError {}

/// What the recognizer driver should do after an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartDecision {
    /// Restart listening after [`RESTART_DELAY`].
    RestartAfterDelay,
    /// Leave the recognizer stopped.
    Stop,
}

/// Restart rule: continuous sessions restart on transient errors only.
pub fn restart_decision(error: &RecognizerError, continuous: bool) -> RestartDecision {
    if continuous && !error.is_permanent() {
        RestartDecision::RestartAfterDelay
    } else {
        RestartDecision::Stop
    }
}

/// Handle onto the external recognizer, used by the session to signal
/// start/stop. Implemented by whatever drives the acoustic engine.
pub trait Recognizer: Send + Sync {
    fn start(&self);
    fn stop(&self);
}
