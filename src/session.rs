//! Session: process state bound to one listening activation. Owns the
//! tracker, cache, queue and generation counter; all mutation goes through
//! its methods instead of cross-callback globals.
//!
//! Stopping a session never aborts in-flight HTTP calls; their results are
//! discarded by the generation gate, and the queue's pending requests are
//! cleared the same way.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::{Config, ConfigError};
use crate::events::{self, DisplayEvent, EventReceiver, EventSender, RenderKind};
use crate::generation::SessionGeneration;
use crate::metrics::{metric_names, MetricsRegistry};
use crate::queue::{QueueContext, QueuePacing, TranslationQueue};
use crate::recognizer::{
    restart_decision, Recognizer, RecognizerError, RestartDecision, TranscriptSnapshot,
};
use crate::status::{SessionStatus, StatusMachine};
use crate::tracker::{TrackDecision, TranscriptTracker};
use crate::translate::cache::TranslationCache;
use crate::translate::{build_chain, FallbackChain};

/// How long an error status stays up before reverting to ready.
const ERROR_REVERT_DELAY: Duration = Duration::from_millis(3000);

pub struct Session {
    config: Config,
    tracker: Mutex<TranscriptTracker>,
    cache: Arc<TranslationCache>,
    queue: TranslationQueue,
    chain: Arc<FallbackChain>,
    generations: Arc<SessionGeneration>,
    status: Arc<StatusMachine>,
    events: EventSender,
    metrics: Arc<MetricsRegistry>,
    recognizer: Mutex<Option<Arc<dyn Recognizer>>>,
    listening: AtomicBool,
}

impl Session {
    /// Build a session with the default provider chain. Fails fast on a
    /// missing credential; that is a configuration error, not something a
    /// fallback backend can repair.
    pub fn new(config: Config) -> Result<(Arc<Self>, EventReceiver), ConfigError> {
        config.validate()?;
        let metrics = Arc::new(MetricsRegistry::new());
        let chain = Arc::new(build_chain(&config, Arc::clone(&metrics))?);
        Ok(Self::with_chain(config, chain, metrics))
    }

    /// Build a session around an explicit provider chain.
    pub fn with_chain(
        config: Config,
        chain: Arc<FallbackChain>,
        metrics: Arc<MetricsRegistry>,
    ) -> (Arc<Self>, EventReceiver) {
        let (events_tx, events_rx) = events::channel();
        let cache = Arc::new(TranslationCache::new(
            &config.source_lang,
            &config.target_lang,
        ));
        let generations = Arc::new(SessionGeneration::new());

        let queue = TranslationQueue::spawn(
            QueueContext {
                chain: Arc::clone(&chain),
                cache: Arc::clone(&cache),
                events: events_tx.clone(),
                generations: Arc::clone(&generations),
                metrics: Arc::clone(&metrics),
                source_lang: config.source_lang.clone(),
                target_lang: config.target_lang.clone(),
            },
            QueuePacing::default(),
        );

        let session = Arc::new(Self {
            tracker: Mutex::new(TranscriptTracker::new(config.track_policy)),
            config,
            cache,
            queue,
            chain,
            generations,
            status: Arc::new(StatusMachine::new()),
            events: events_tx,
            metrics,
            recognizer: Mutex::new(None),
            listening: AtomicBool::new(false),
        });
        (session, events_rx)
    }

    /// Attach the external recognizer handle so start/stop can signal it.
    pub fn attach_recognizer(&self, recognizer: Arc<dyn Recognizer>) {
        *self.recognizer.lock() = Some(recognizer);
    }

    pub fn status(&self) -> SessionStatus {
        self.status.current()
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    pub fn current_generation(&self) -> u64 {
        self.generations.current()
    }

    /// Begin a listening activation: fresh generation, cleared baselines.
    pub fn start(&self) {
        if self.listening.swap(true, Ordering::SeqCst) {
            debug!("already listening");
            return;
        }

        let generation = self.generations.advance();
        self.tracker.lock().reset();
        self.cache.clear();

        if let Some(recognizer) = self.recognizer.lock().as_ref() {
            recognizer.start();
        }

        self.set_status(SessionStatus::Listening, None);
        info!(generation, providers = ?self.chain.provider_names(), "session started");
    }

    /// Tear down the activation. Pending queued requests are cleared and any
    /// in-flight results are silently discarded.
    pub fn stop(&self) {
        if !self.listening.swap(false, Ordering::SeqCst) {
            return;
        }

        if let Some(recognizer) = self.recognizer.lock().as_ref() {
            recognizer.stop();
        }

        let generation = self.generations.advance();
        self.set_status(SessionStatus::Ready, None);
        info!(generation, "session stopped");
    }

    /// Feed one recognizer snapshot through the tracker.
    pub fn on_snapshot(self: &Arc<Self>, snapshot: &TranscriptSnapshot) {
        if !self.is_listening() {
            return;
        }

        let _ = self.events.send(DisplayEvent::Transcript {
            final_text: snapshot.final_text.clone(),
            interim_text: snapshot.interim_text.clone(),
        });

        match self.tracker.lock().on_snapshot(snapshot) {
            TrackDecision::Skip => {}
            TrackDecision::Partial(text) => self.dispatch_partial(text),
            TrackDecision::Final(text) => {
                self.queue.enqueue(text, self.generations.current());
            }
        }
    }

    /// The recognizer stopped delivering audio but may resume.
    pub fn mark_processing(&self) {
        if self.is_listening() {
            let _ = self.status.transition(SessionStatus::Processing);
            let _ = self.events.send(DisplayEvent::Status {
                status: SessionStatus::Processing,
                message: None,
            });
        }
    }

    /// Surface a recognizer failure and tell the driver what to do next.
    /// Permanent errors (permission, audio capture) never restart.
    pub fn on_recognizer_error(self: &Arc<Self>, error: &RecognizerError) -> RestartDecision {
        warn!(error = %error, "recognizer error");

        let decision = restart_decision(error, self.config.continuous);
        if decision == RestartDecision::Stop {
            self.listening.store(false, Ordering::SeqCst);
            if let Some(recognizer) = self.recognizer.lock().as_ref() {
                recognizer.stop();
            }
            self.generations.advance();
        }

        self.set_status(SessionStatus::Error, Some(error.user_message()));
        self.schedule_error_revert();
        decision
    }

    /// Partial-mode requests bypass the queue: dispatched immediately, errors
    /// swallowed, last response to arrive wins the display.
    fn dispatch_partial(self: &Arc<Self>, text: String) {
        let guard = self.generations.guard();
        let chain = Arc::clone(&self.chain);
        let cache = Arc::clone(&self.cache);
        let events = self.events.clone();
        let metrics = Arc::clone(&self.metrics);
        let source_lang = self.config.source_lang.clone();
        let target_lang = self.config.target_lang.clone();

        tokio::spawn(async move {
            let started = Instant::now();
            match chain.translate(&text, &source_lang, &target_lang).await {
                Ok(translated) => {
                    metrics.record_ms(
                        metric_names::PARTIAL_TRANSLATE,
                        started.elapsed().as_secs_f64() * 1000.0,
                    );
                    cache.record(&text, translated.clone(), now_ms());

                    if guard.is_current() {
                        let _ = events.send(DisplayEvent::Translation {
                            kind: RenderKind::Partial,
                            text: translated,
                        });
                    } else {
                        metrics.incr(metric_names::PARTIAL_DROPPED);
                        debug!("stale partial result discarded");
                    }
                }
                Err(e) => {
                    // Swallowed: a later partial or final supersedes it.
                    debug!(error = %e, "partial translation failed");
                }
            }
        });
    }

    fn set_status(&self, status: SessionStatus, message: Option<String>) {
        if self.status.transition(status).is_err() {
            match status {
                SessionStatus::Ready => self.status.force_ready(),
                // Restarting inside the error hold goes through ready first;
                // the stale revert task must not find the session wedged.
                SessionStatus::Listening
                    if self.status.current() == SessionStatus::Error =>
                {
                    self.status.force_ready();
                    if self.status.transition(status).is_err() {
                        return;
                    }
                }
                _ => return,
            }
        }
        let _ = self.events.send(DisplayEvent::Status { status, message });
    }

    /// Error status auto-reverts to ready unless the session moved on.
    fn schedule_error_revert(self: &Arc<Self>) {
        let guard = self.generations.guard();
        let status = Arc::clone(&self.status);
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(ERROR_REVERT_DELAY).await;
            if guard.is_current() && status.current() == SessionStatus::Error {
                status.force_ready();
                let _ = events.send(DisplayEvent::Status {
                    status: SessionStatus::Ready,
                    message: None,
                });
            }
        });
    }
}

/// Current wall-clock time in milliseconds.
fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
