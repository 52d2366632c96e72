//! In-memory translation cache with TTL and a shorter dedupe window.
//! Key: blake3 hash of (source_lang | target_lang | trimmed lowercased text).
//!
//! Every successful provider call is recorded, partial or final. Final-mode
//! requests consult the dedupe window before issuing; entries older than the
//! TTL are purged lazily on each write. Timestamps are passed in explicitly
//! so the windows are testable without sleeping.

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

/// Entries older than this are purged on each write.
pub const CACHE_TTL_MS: u64 = 30_000;
/// A fresh hit within this window suppresses a duplicate Final-mode request.
pub const DEDUPE_WINDOW_MS: u64 = 10_000;
/// Upper bound on live entries; the TTL purge keeps it from mattering often.
const CACHE_CAPACITY: usize = 512;

/// A prior translation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedTranslation {
    pub translated_text: String,
    pub recorded_at_ms: u64,
}

impl CachedTranslation {
    /// True if recorded within `window_ms` of `now_ms`.
    pub fn is_fresh(&self, now_ms: u64, window_ms: u64) -> bool {
        now_ms.saturating_sub(self.recorded_at_ms) < window_ms
    }
}

/// Session-scoped cache for one language pair.
pub struct TranslationCache {
    inner: Mutex<LruCache<[u8; 32], CachedTranslation>>,
    source_lang: String,
    target_lang: String,
}

impl TranslationCache {
    pub fn new(source_lang: &str, target_lang: &str) -> Self {
        Self {
            inner: Mutex::new(LruCache::new(
                NonZeroUsize::new(CACHE_CAPACITY).expect("cache capacity must be > 0"),
            )),
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
        }
    }

    fn key(&self, text: &str) -> [u8; 32] {
        let normalized = text.trim().to_lowercase();
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.source_lang.as_bytes());
        hasher.update(b"|");
        hasher.update(self.target_lang.as_bytes());
        hasher.update(b"|");
        hasher.update(normalized.as_bytes());
        *hasher.finalize().as_bytes()
    }

    /// Look up a prior translation for `text`. Returns None if absent or
    /// older than the TTL.
    pub fn lookup(&self, text: &str, now_ms: u64) -> Option<CachedTranslation> {
        let key = self.key(text);
        let mut cache = self.inner.lock();
        if let Some(entry) = cache.get(&key) {
            if entry.is_fresh(now_ms, CACHE_TTL_MS) {
                return Some(entry.clone());
            }
            cache.pop(&key);
        }
        None
    }

    /// Record a translation, overwriting any entry for the same normalized
    /// text, then purge everything older than the TTL.
    pub fn record(&self, text: &str, translated_text: String, now_ms: u64) {
        let key = self.key(text);
        let mut cache = self.inner.lock();
        cache.put(
            key,
            CachedTranslation {
                translated_text,
                recorded_at_ms: now_ms,
            },
        );
        Self::purge_locked(&mut cache, now_ms, CACHE_TTL_MS);
    }

    /// Drop entries recorded more than `ttl_ms` before `now_ms`.
    pub fn purge_older_than(&self, now_ms: u64, ttl_ms: u64) {
        let mut cache = self.inner.lock();
        Self::purge_locked(&mut cache, now_ms, ttl_ms);
    }

    fn purge_locked(cache: &mut LruCache<[u8; 32], CachedTranslation>, now_ms: u64, ttl_ms: u64) {
        let expired: Vec<[u8; 32]> = cache
            .iter()
            .filter(|(_, entry)| !entry.is_fresh(now_ms, ttl_ms))
            .map(|(key, _)| *key)
            .collect();
        for key in expired {
            cache.pop(&key);
        }
    }

    /// Drop everything; called on session teardown.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
