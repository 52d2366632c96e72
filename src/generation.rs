//! Session generations: each start/stop advances a counter and cancels the
//! previous generation's tasks. In-flight provider calls are never aborted
//! mid-request; their results are discarded by the generation gate so stale
//! partials cannot appear after a restart.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

/// Tracks the current session generation and its cancellation token.
pub struct SessionGeneration {
    current_token: RwLock<CancellationToken>,
    generation: Arc<AtomicU64>,
}

impl SessionGeneration {
    pub fn new() -> Self {
        Self {
            current_token: RwLock::new(CancellationToken::new()),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Cancel all tasks of the current generation and advance to a fresh one.
    /// Called on session start and stop. Returns the new generation.
    pub fn advance(&self) -> u64 {
        let mut token = self.current_token.write();
        token.cancel();
        *token = CancellationToken::new();
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Current generation number.
    pub fn current(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Guard for a task spawned under the current generation.
    pub fn guard(&self) -> GenerationGuard {
        let token = self.current_token.read().child_token();
        GenerationGuard {
            generation: Arc::clone(&self.generation),
            my_generation: self.generation.load(Ordering::SeqCst),
            token,
        }
    }
}

impl Default for SessionGeneration {
    fn default() -> Self {
        Self::new()
    }
}

/// Checked before writing any result to the display path.
/// Stale if the session has restarted or stopped since the task was spawned.
#[derive(Clone)]
pub struct GenerationGuard {
    generation: Arc<AtomicU64>,
    my_generation: u64,
    token: CancellationToken,
}

impl GenerationGuard {
    /// True while this task belongs to the live generation and has not been
    /// cancelled.
    #[inline]
    pub fn is_current(&self) -> bool {
        !self.token.is_cancelled()
            && self.generation.load(Ordering::SeqCst) == self.my_generation
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn generation(&self) -> u64 {
        self.my_generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_current_until_advance() {
        let gens = SessionGeneration::new();
        gens.advance();
        let guard = gens.guard();
        assert!(guard.is_current());

        gens.advance();
        assert!(!guard.is_current());
    }

    #[test]
    fn advance_is_monotonic() {
        let gens = SessionGeneration::new();
        let a = gens.advance();
        let b = gens.advance();
        assert!(b > a);
        assert_eq!(gens.current(), b);
    }

    #[test]
    fn cancelled_token_invalidates_guard() {
        let gens = SessionGeneration::new();
        let guard = gens.guard();
        gens.advance();
        assert!(guard.token().is_cancelled());
        assert!(!guard.is_current());
    }
}
