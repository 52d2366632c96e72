//! lingoflow: real-time speech translation pipeline.
//!
//! Turns a continuous, revisable stream of partial speech-recognition
//! hypotheses into a throttled, deduplicated, queued sequence of translation
//! requests, and folds the results into a renderable display model.
//!
//! The acoustic recognizer, the translation backends and the actual display
//! are external collaborators: the recognizer feeds [`recognizer::TranscriptSnapshot`]
//! values into a [`session::Session`], providers implement
//! [`translate::TranslationProvider`], and the display consumes
//! [`events::DisplayEvent`] values, optionally through [`display::reduce`].

pub mod config;
pub mod display;
pub mod events;
pub mod generation;
pub mod metrics;
pub mod queue;
pub mod recognizer;
pub mod session;
pub mod similarity;
pub mod status;
pub mod tracker;
pub mod translate;

pub use config::{Config, ConfigError, FallbackPolicy, TrackPolicy};
pub use events::{DisplayEvent, RenderKind};
pub use recognizer::{RecognizerError, RestartDecision, TranscriptSnapshot};
pub use session::Session;
pub use status::SessionStatus;
pub use translate::{FallbackChain, ProviderError, TranslationProvider};

/// Initialize tracing from `RUST_LOG`, defaulting to debug for this crate.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("lingoflow=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
