//! End-to-end pipeline tests: recognizer snapshots in, display events out,
//! with a scripted provider standing in for the HTTP backends.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use lingoflow::config::FallbackPolicy;
use lingoflow::events::EventReceiver;
use lingoflow::metrics::MetricsRegistry;
use lingoflow::translate::FallbackChain;
use lingoflow::{
    Config, DisplayEvent, ProviderError, RenderKind, Session, SessionStatus, TrackPolicy,
    TranscriptSnapshot, TranslationProvider,
};

/// Uppercases the text after a simulated network delay.
struct EchoProvider {
    calls: Mutex<Vec<String>>,
    delay: Duration,
}

impl EchoProvider {
    fn new(delay: Duration) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            delay,
        }
    }
}

#[async_trait]
impl TranslationProvider for EchoProvider {
    fn name(&self) -> &'static str {
        "echo"
    }

    async fn translate_raw(
        &self,
        text: &str,
        _source_lang: &str,
        _target_lang: &str,
    ) -> Result<String, ProviderError> {
        self.calls.lock().push(text.to_string());
        tokio::time::sleep(self.delay).await;
        Ok(text.to_uppercase())
    }
}

fn pipeline(
    policy: TrackPolicy,
    delay: Duration,
) -> (Arc<Session>, EventReceiver, Arc<EchoProvider>) {
    let provider = Arc::new(EchoProvider::new(delay));
    let metrics = Arc::new(MetricsRegistry::new());
    let chain = Arc::new(FallbackChain::new(
        vec![Arc::clone(&provider) as Arc<dyn TranslationProvider>],
        FallbackPolicy::TransientOnly,
        Arc::clone(&metrics),
    ));
    let mut config = Config::new("id", "de");
    config.track_policy = policy;
    let (session, rx) = Session::with_chain(config, chain, metrics);
    (session, rx, provider)
}

async fn next_translation(rx: &mut EventReceiver) -> (RenderKind, String) {
    loop {
        match rx.recv().await.expect("event stream open") {
            DisplayEvent::Translation { kind, text } => return (kind, text),
            _ => continue,
        }
    }
}

#[tokio::test(start_paused = true)]
async fn growing_interims_stream_partial_translations() {
    let (session, mut rx, provider) = pipeline(TrackPolicy::Flow, Duration::from_millis(20));
    session.start();

    session.on_snapshot(&TranscriptSnapshot::interim("halo"));
    session.on_snapshot(&TranscriptSnapshot::interim("halo dunia"));

    let (kind, text) = next_translation(&mut rx).await;
    assert_eq!(kind, RenderKind::Partial);
    let (kind2, text2) = next_translation(&mut rx).await;
    assert_eq!(kind2, RenderKind::Partial);

    // Last write wins on the display; both snapshots were translated.
    let texts = [text, text2];
    assert!(texts.contains(&"HALO".to_string()));
    assert!(texts.contains(&"HALO DUNIA".to_string()));
    assert_eq!(provider.calls.lock().len(), 2);

    session.stop();
}

#[tokio::test(start_paused = true)]
async fn shrinking_revision_translates_nothing() {
    let (session, _rx, provider) = pipeline(TrackPolicy::Flow, Duration::from_millis(5));
    session.start();

    session.on_snapshot(&TranscriptSnapshot::interim("halo dunia apa"));
    tokio::time::sleep(Duration::from_millis(100)).await;
    session.on_snapshot(&TranscriptSnapshot::interim("halo dunia"));
    session.on_snapshot(&TranscriptSnapshot::interim("halo dunia"));
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(provider.calls.lock().clone(), vec!["halo dunia apa"]);
    session.stop();
}

#[tokio::test(start_paused = true)]
async fn finals_are_skipped_in_flow_mode() {
    let (session, _rx, provider) = pipeline(TrackPolicy::Flow, Duration::from_millis(5));
    session.start();

    session.on_snapshot(&TranscriptSnapshot::interim("halo dunia"));
    session.on_snapshot(&TranscriptSnapshot::finalized("halo dunia"));
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Only the interim fired; the final event just reset the baseline.
    assert_eq!(provider.calls.lock().clone(), vec!["halo dunia"]);

    // Post-final interim shorter than the old baseline still fires.
    session.on_snapshot(&TranscriptSnapshot::interim("apa"));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(provider.calls.lock().len(), 2);

    session.stop();
}

#[tokio::test(start_paused = true)]
async fn final_only_mode_queues_final_segments() {
    let (session, mut rx, provider) =
        pipeline(TrackPolicy::FinalOnly, Duration::from_millis(5));
    session.start();

    session.on_snapshot(&TranscriptSnapshot::interim("halo"));
    session.on_snapshot(&TranscriptSnapshot::finalized("halo dunia "));

    let (kind, text) = next_translation(&mut rx).await;
    assert_eq!(kind, RenderKind::Final);
    assert_eq!(text, "HALO DUNIA");
    assert_eq!(provider.calls.lock().clone(), vec!["halo dunia"]);

    session.stop();
}

#[tokio::test(start_paused = true)]
async fn stale_partials_are_discarded_after_stop() {
    let (session, mut rx, provider) = pipeline(TrackPolicy::Flow, Duration::from_millis(500));
    session.start();

    session.on_snapshot(&TranscriptSnapshot::interim("halo dunia"));
    // Stop before the provider responds; the in-flight call completes but
    // its result must not reach the display.
    session.stop();

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(provider.calls.lock().len(), 1);

    let mut saw_translation = false;
    while let Ok(event) = rx.try_recv() {
        if matches!(event, DisplayEvent::Translation { .. }) {
            saw_translation = true;
        }
    }
    assert!(!saw_translation, "stale partial reached the display");
}

#[tokio::test(start_paused = true)]
async fn status_events_bracket_the_session() {
    let (session, mut rx, _provider) = pipeline(TrackPolicy::Flow, Duration::from_millis(5));
    session.start();
    session.stop();

    let mut statuses = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let DisplayEvent::Status { status, .. } = event {
            statuses.push(status);
        }
    }
    assert_eq!(
        statuses,
        vec![SessionStatus::Listening, SessionStatus::Ready]
    );
}
