//! Pure display reducer: folds the event stream into a renderable view
//! model. Flow display keeps a single current translation line; each result
//! replaces the previous one rather than appending to a log.

use serde::Serialize;

use crate::events::{DisplayEvent, RenderKind};
use crate::status::SessionStatus;

/// One rendered translation line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationLine {
    pub kind: RenderKind,
    pub text: String,
}

/// Renderable state of the whole popup.
#[derive(Debug, Clone, Serialize)]
pub struct DisplayView {
    pub status: SessionStatus,
    pub status_message: Option<String>,
    pub final_text: String,
    pub interim_text: String,
    /// Current translation line, if any. Single-entry by design: the flow
    /// display shows only the sentence being spoken.
    pub translation: Option<TranslationLine>,
}

impl DisplayView {
    pub fn new() -> Self {
        Self {
            status: SessionStatus::Ready,
            status_message: None,
            final_text: String::new(),
            interim_text: String::new(),
            translation: None,
        }
    }
}

impl Default for DisplayView {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply one event to the view.
pub fn reduce(view: &mut DisplayView, event: &DisplayEvent) {
    match event {
        DisplayEvent::Status { status, message } => {
            view.status = *status;
            view.status_message = message.clone();
            if *status == SessionStatus::Listening {
                // Fresh session: clear everything carried over.
                view.final_text.clear();
                view.interim_text.clear();
                view.translation = None;
            }
        }
        DisplayEvent::Translation { kind, text } => {
            view.translation = Some(TranslationLine {
                kind: *kind,
                text: text.trim().to_string(),
            });
        }
        DisplayEvent::Transcript {
            final_text,
            interim_text,
        } => {
            view.final_text = final_text.clone();
            view.interim_text = interim_text.clone();
        }
    }
}
