//! Typed display event channel. Replaces ad-hoc `onResult`/`onError`/
//! `onStatusChange` callback wiring with one ordered stream the display
//! collaborator consumes.

use serde::Serialize;
use tokio::sync::mpsc;

use crate::status::SessionStatus;

/// How a translation line should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderKind {
    Partial,
    Final,
    Error,
}

/// Everything the display collaborator needs, in emission order.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DisplayEvent {
    Status {
        status: SessionStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Translation {
        kind: RenderKind,
        text: String,
    },
    Transcript {
        final_text: String,
        interim_text: String,
    },
}

pub type EventSender = mpsc::UnboundedSender<DisplayEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<DisplayEvent>;

/// Display event channel. Unbounded: the producer side must never block the
/// recognizer callback path.
pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
