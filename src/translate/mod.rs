//! Translation provider adapter: an object-safe capability over
//! "translate(text, source, target) -> text", with sentence-boundary chunking
//! for length-limited backends and a fallback chain across providers.

pub mod cache;
pub mod deepl;
pub mod mymemory;

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::{Config, ConfigError, FallbackPolicy};
use crate::metrics::{metric_names, MetricsRegistry};

/// Pacing between sequential chunk requests against one provider.
const CHUNK_PACING: Duration = Duration::from_millis(100);

/// Provider failure classification. Carries the provider name and, where
/// applicable, the HTTP status.
#[derive(Debug, Clone)]
pub enum ProviderError {
    Http {
        provider: &'static str,
        status: u16,
        message: String,
    },
    Transport {
        provider: &'static str,
        message: String,
    },
    Timeout {
        provider: &'static str,
    },
    Malformed {
        provider: &'static str,
        message: String,
    },
    Auth {
        provider: &'static str,
        message: String,
    },
    QuotaExhausted {
        provider: &'static str,
        message: String,
    },
}

impl ProviderError {
    pub fn provider(&self) -> &'static str {
        match self {
            ProviderError::Http { provider, .. }
            | ProviderError::Transport { provider, .. }
            | ProviderError::Timeout { provider }
            | ProviderError::Malformed { provider, .. }
            | ProviderError::Auth { provider, .. }
            | ProviderError::QuotaExhausted { provider, .. } => provider,
        }
    }

    /// Auth and quota failures are tied to one backend's configuration;
    /// retrying the same request elsewhere is a policy decision, not a
    /// transient recovery.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ProviderError::Auth { .. } | ProviderError::QuotaExhausted { .. }
        )
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::Http {
                provider,
                status,
                message,
            } => write!(f, "{provider}: HTTP {status} - {message}"),
            ProviderError::Transport { provider, message } => {
                write!(f, "{provider}: transport error: {message}")
            }
            ProviderError::Timeout { provider } => write!(f, "{provider}: request timed out"),
            ProviderError::Malformed { provider, message } => {
                write!(f, "{provider}: malformed response: {message}")
            }
            ProviderError::Auth { provider, message } => {
                write!(f, "{provider}: authentication failed: {message}")
            }
            ProviderError::QuotaExhausted { provider, message } => {
                write!(f, "{provider}: quota exhausted: {message}")
            }
        }
    }
}

impl std::error::Error for ProviderError {}

/// A translation backend. Implementations issue exactly one request per
/// `translate_raw` call; chunking happens above them.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Maximum accepted source length in characters, if the backend has one.
    fn max_text_len(&self) -> Option<usize> {
        None
    }

    async fn translate_raw(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, ProviderError>;
}

/// Translate through one provider, splitting into sentence chunks when the
/// text exceeds its limit. Chunks are translated sequentially with a pacing
/// delay and joined with single spaces; any chunk failure aborts the whole
/// operation.
pub async fn translate_with(
    provider: &dyn TranslationProvider,
    text: &str,
    source_lang: &str,
    target_lang: &str,
) -> Result<String, ProviderError> {
    match provider.max_text_len() {
        Some(max_len) if text.chars().count() > max_len => {
            let chunks = chunk_sentences(text, max_len);
            debug!(
                provider = provider.name(),
                chunks = chunks.len(),
                chars = text.chars().count(),
                "splitting long text"
            );
            let mut translated = Vec::with_capacity(chunks.len());
            for (i, chunk) in chunks.iter().enumerate() {
                translated.push(
                    provider
                        .translate_raw(chunk, source_lang, target_lang)
                        .await?,
                );
                if i + 1 < chunks.len() {
                    tokio::time::sleep(CHUNK_PACING).await;
                }
            }
            Ok(translated.join(" "))
        }
        _ => provider.translate_raw(text, source_lang, target_lang).await,
    }
}

fn sentence_regex() -> &'static regex::Regex {
    static SENTENCE_RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    SENTENCE_RE.get_or_init(|| {
        regex::Regex::new(r"[^.!?]+[.!?]+").expect("sentence regex is valid")
    })
}

/// Split text into sentences ending in `.`, `!` or `?`. A trailing fragment
/// without a terminator becomes one final sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut last_end = 0;
    for m in sentence_regex().find_iter(text) {
        sentences.push(m.as_str().to_string());
        last_end = m.end();
    }
    let rest = &text[last_end..];
    if !rest.trim().is_empty() {
        sentences.push(rest.to_string());
    }
    if sentences.is_empty() {
        sentences.push(text.to_string());
    }
    sentences
}

/// Group sentences into chunks each at most `max_len` characters, preserving
/// order. A single sentence longer than the limit becomes its own chunk.
pub fn chunk_sentences(text: &str, max_len: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for sentence in split_sentences(text) {
        if !current.is_empty()
            && current.chars().count() + sentence.chars().count() > max_len
        {
            chunks.push(current.trim().to_string());
            current = sentence;
        } else {
            current.push_str(&sentence);
        }
    }
    if !current.trim().is_empty() {
        chunks.push(current.trim().to_string());
    }
    chunks
}

/// Ordered providers tried in sequence. The first success wins; whether a
/// fatal (auth/quota) primary failure may still fall through is set by
/// [`FallbackPolicy`].
pub struct FallbackChain {
    providers: Vec<Arc<dyn TranslationProvider>>,
    policy: FallbackPolicy,
    metrics: Arc<MetricsRegistry>,
}

impl FallbackChain {
    pub fn new(
        providers: Vec<Arc<dyn TranslationProvider>>,
        policy: FallbackPolicy,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            providers,
            policy,
            metrics,
        }
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, ProviderError> {
        let mut last_error: Option<ProviderError> = None;

        for (i, provider) in self.providers.iter().enumerate() {
            let started = Instant::now();
            match translate_with(provider.as_ref(), text, source_lang, target_lang).await {
                Ok(translated) => {
                    self.metrics.record_ms(
                        metric_names::PROVIDER_CALL,
                        started.elapsed().as_secs_f64() * 1000.0,
                    );
                    if i > 0 {
                        self.metrics.incr(metric_names::FALLBACK_USED);
                    }
                    return Ok(translated);
                }
                Err(e) => {
                    let surface_now =
                        e.is_fatal() && self.policy == FallbackPolicy::TransientOnly;
                    warn!(
                        provider = provider.name(),
                        error = %e,
                        fatal = e.is_fatal(),
                        "provider failed"
                    );
                    if surface_now {
                        return Err(e);
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(ProviderError::Transport {
            provider: "fallback-chain",
            message: "no providers configured".to_string(),
        }))
    }
}

/// Build a provider by its registry name.
pub fn provider_from_name(
    name: &str,
    config: &Config,
) -> Result<Arc<dyn TranslationProvider>, ConfigError> {
    match name {
        deepl::PROVIDER_NAME => {
            let key = config
                .deepl_api_key
                .clone()
                .ok_or(ConfigError::MissingCredential("DEEPL_API_KEY"))?;
            Ok(Arc::new(deepl::DeepLProvider::new(
                key,
                config.deepl_api_url.clone(),
            )))
        }
        mymemory::PROVIDER_NAME => Ok(Arc::new(mymemory::MyMemoryProvider::new(
            config.mymemory_api_url.clone(),
        ))),
        _ => Err(ConfigError::MissingField("known provider name")),
    }
}

/// Default chain: commercial primary, free-tier fallback.
pub fn build_chain(
    config: &Config,
    metrics: Arc<MetricsRegistry>,
) -> Result<FallbackChain, ConfigError> {
    let providers = vec![
        provider_from_name(deepl::PROVIDER_NAME, config)?,
        provider_from_name(mymemory::PROVIDER_NAME, config)?,
    ];
    Ok(FallbackChain::new(providers, config.fallback_policy, metrics))
}
