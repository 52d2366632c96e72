//! Final-mode translation queue: FIFO, single-flight by construction (one
//! worker task drains it), paced between requests so the provider and the
//! display get room to breathe.
//!
//! Failures are surfaced as error-tagged display entries and never retried;
//! the queue moves on to the next item after a back-off. Partial-mode
//! requests never pass through here.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::events::{DisplayEvent, EventSender, RenderKind};
use crate::generation::SessionGeneration;
use crate::metrics::{metric_names, MetricsRegistry};
use crate::translate::cache::{TranslationCache, DEDUPE_WINDOW_MS};
use crate::translate::{FallbackChain, ProviderError};

/// Delay after a successful request before draining the next.
pub const SUCCESS_PACING: Duration = Duration::from_millis(100);
/// Back-off after a failed request.
pub const FAILURE_BACKOFF: Duration = Duration::from_millis(1000);

/// Inter-request delays, overridable for tests.
#[derive(Debug, Clone, Copy)]
pub struct QueuePacing {
    pub success_pacing: Duration,
    pub failure_backoff: Duration,
}

impl Default for QueuePacing {
    fn default() -> Self {
        Self {
            success_pacing: SUCCESS_PACING,
            failure_backoff: FAILURE_BACKOFF,
        }
    }
}

/// A queued Final-mode request.
#[derive(Debug)]
struct FinalRequest {
    request_id: String,
    source_text: String,
    generation: u64,
    enqueued_at: Instant,
}

/// A provider failure that occurred while draining the queue.
#[derive(Debug)]
pub struct QueueError {
    pub request_id: String,
    pub source: ProviderError,
}

impl std::fmt::Display for QueueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "final translation failed: {}", self.source)
    }
}

impl std::error::Error for QueueError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Everything the drain loop needs.
pub struct QueueContext {
    pub chain: Arc<FallbackChain>,
    pub cache: Arc<TranslationCache>,
    pub events: EventSender,
    pub generations: Arc<SessionGeneration>,
    pub metrics: Arc<MetricsRegistry>,
    pub source_lang: String,
    pub target_lang: String,
}

/// Handle for enqueueing. Dropping every handle shuts the worker down.
pub struct TranslationQueue {
    tx: mpsc::UnboundedSender<FinalRequest>,
}

impl TranslationQueue {
    /// Spawn the drain worker and return the enqueue handle.
    pub fn spawn(ctx: QueueContext, pacing: QueuePacing) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(drain_loop(rx, ctx, pacing));
        Self { tx }
    }

    /// Enqueue a Final-mode request under the given session generation.
    pub fn enqueue(&self, source_text: String, generation: u64) {
        let request = FinalRequest {
            request_id: uuid::Uuid::new_v4().to_string(),
            source_text,
            generation,
            enqueued_at: Instant::now(),
        };
        if self.tx.send(request).is_err() {
            warn!("translation queue closed, request dropped");
        }
    }
}

/// Single worker: at most one Final-mode request is in flight at any
/// instant, and results come back in enqueue order.
async fn drain_loop(
    mut rx: mpsc::UnboundedReceiver<FinalRequest>,
    ctx: QueueContext,
    pacing: QueuePacing,
) {
    debug!(providers = ?ctx.chain.provider_names(), "translation queue started");

    while let Some(request) = rx.recv().await {
        // Requests enqueued before a stop/restart are cleared by skipping.
        if ctx.generations.current() != request.generation {
            debug!(request_id = %request.request_id, "skipping stale queued request");
            continue;
        }

        ctx.metrics.record_ms(
            metric_names::QUEUE_WAIT,
            request.enqueued_at.elapsed().as_secs_f64() * 1000.0,
        );

        // Dedupe: a fresh cache hit means this exact text was just translated.
        let now = now_ms();
        if let Some(hit) = ctx.cache.lookup(&request.source_text, now) {
            ctx.metrics.incr(metric_names::CACHE_HIT);
            if hit.is_fresh(now, DEDUPE_WINDOW_MS) {
                ctx.metrics.incr(metric_names::DEDUPE_SKIP);
                debug!(request_id = %request.request_id, "skipping duplicate translation");
                continue;
            }
        }

        let started = Instant::now();
        let result = ctx
            .chain
            .translate(&request.source_text, &ctx.source_lang, &ctx.target_lang)
            .await;

        match result {
            Ok(translated) => {
                ctx.metrics.record_ms(
                    metric_names::FINAL_TRANSLATE,
                    started.elapsed().as_secs_f64() * 1000.0,
                );
                ctx.cache
                    .record(&request.source_text, translated.clone(), now_ms());

                if ctx.generations.current() == request.generation {
                    let _ = ctx.events.send(DisplayEvent::Translation {
                        kind: RenderKind::Final,
                        text: translated,
                    });
                }
                tokio::time::sleep(pacing.success_pacing).await;
            }
            Err(e) => {
                ctx.metrics.incr(metric_names::FINAL_FAILED);
                let error = QueueError {
                    request_id: request.request_id,
                    source: e,
                };
                warn!(request_id = %error.request_id, error = %error.source, "queued translation failed");

                // Dropped, never retried; the user sees an inline error
                // instead of silence.
                if ctx.generations.current() == request.generation {
                    let _ = ctx.events.send(DisplayEvent::Translation {
                        kind: RenderKind::Error,
                        text: format!("[Error: {}]", error.source),
                    });
                }
                tokio::time::sleep(pacing.failure_backoff).await;
            }
        }
    }

    info!("translation queue exiting (all handles dropped)");
}

/// Current wall-clock time in milliseconds.
fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
