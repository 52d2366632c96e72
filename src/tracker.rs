//! Incremental transcript tracker: diffs successive recognizer snapshots and
//! decides when a translation should fire.
//!
//! Recognizers revise hypotheses freely, so a naive "translate every update"
//! floods the provider with near-duplicates. The tracker fires only on
//! strictly growing new interim content; shrinking revisions and identical
//! repeats never fire.

use crate::config::TrackPolicy;
use crate::recognizer::TranscriptSnapshot;

/// What the tracker decided for one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackDecision {
    /// Nothing new worth translating.
    Skip,
    /// Dispatch immediately, bypassing the queue.
    Partial(String),
    /// Enqueue as a Final-mode request (FinalOnly policy).
    Final(String),
}

/// Per-session tracker state. Reset on session start.
pub struct TranscriptTracker {
    policy: TrackPolicy,
    previous_interim: String,
    /// Length of final text already consumed (FinalOnly policy).
    consumed_final_len: usize,
}

impl TranscriptTracker {
    pub fn new(policy: TrackPolicy) -> Self {
        Self {
            policy,
            previous_interim: String::new(),
            consumed_final_len: 0,
        }
    }

    /// Clear diff baselines; call when a listening session starts.
    pub fn reset(&mut self) {
        self.previous_interim.clear();
        self.consumed_final_len = 0;
    }

    /// Evaluate one snapshot against the previous one.
    pub fn on_snapshot(&mut self, snapshot: &TranscriptSnapshot) -> TrackDecision {
        if snapshot.is_final_event && !snapshot.final_text.trim().is_empty() {
            // Sentence completed: the next interim segment is fresh content.
            self.previous_interim.clear();

            return match self.policy {
                TrackPolicy::Flow => TrackDecision::Skip,
                TrackPolicy::FinalOnly => {
                    let new_segment = snapshot
                        .final_text
                        .get(self.consumed_final_len..)
                        .unwrap_or("")
                        .trim();
                    self.consumed_final_len = snapshot.final_text.len();
                    if new_segment.is_empty() {
                        TrackDecision::Skip
                    } else {
                        TrackDecision::Final(new_segment.to_string())
                    }
                }
            };
        }

        if snapshot.interim_text.trim().is_empty() {
            return TrackDecision::Skip;
        }

        let decision = if self.policy == TrackPolicy::Flow {
            let current = snapshot.interim_text.trim();
            let previous = self.previous_interim.trim();
            // Strictly growing new content only; shrinkage means the
            // recognizer revised its hypothesis. Length is in characters,
            // not bytes.
            if current != previous && current.chars().count() > previous.chars().count() {
                TrackDecision::Partial(current.to_string())
            } else {
                TrackDecision::Skip
            }
        } else {
            TrackDecision::Skip
        };

        self.previous_interim = snapshot.interim_text.clone();
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow_tracker() -> TranscriptTracker {
        TranscriptTracker::new(TrackPolicy::Flow)
    }

    #[test]
    fn growing_interim_fires_each_update() {
        // Literal-diff semantics: each strictly growing snapshot fires.
        let mut tracker = flow_tracker();
        assert_eq!(
            tracker.on_snapshot(&TranscriptSnapshot::interim("halo")),
            TrackDecision::Partial("halo".to_string())
        );
        assert_eq!(
            tracker.on_snapshot(&TranscriptSnapshot::interim("halo dunia")),
            TrackDecision::Partial("halo dunia".to_string())
        );
    }

    #[test]
    fn shrinking_revision_never_fires() {
        let mut tracker = flow_tracker();
        tracker.on_snapshot(&TranscriptSnapshot::interim("halo dunia"));
        assert_eq!(
            tracker.on_snapshot(&TranscriptSnapshot::interim("halo")),
            TrackDecision::Skip
        );
    }

    #[test]
    fn identical_interim_never_fires() {
        let mut tracker = flow_tracker();
        tracker.on_snapshot(&TranscriptSnapshot::interim("halo"));
        assert_eq!(
            tracker.on_snapshot(&TranscriptSnapshot::interim("halo")),
            TrackDecision::Skip
        );
        // Same trimmed text with extra whitespace is still identical.
        assert_eq!(
            tracker.on_snapshot(&TranscriptSnapshot::interim("  halo  ")),
            TrackDecision::Skip
        );
    }

    #[test]
    fn growth_is_measured_in_characters_not_bytes() {
        // "héé" is 5 bytes but only 3 chars: a shrinking revision.
        let mut tracker = flow_tracker();
        tracker.on_snapshot(&TranscriptSnapshot::interim("abcd"));
        assert_eq!(
            tracker.on_snapshot(&TranscriptSnapshot::interim("héé")),
            TrackDecision::Skip
        );

        // "abc" is 3 bytes but grows from 2 to 3 chars: fires.
        let mut tracker = flow_tracker();
        tracker.on_snapshot(&TranscriptSnapshot::interim("éé"));
        assert_eq!(
            tracker.on_snapshot(&TranscriptSnapshot::interim("abc")),
            TrackDecision::Partial("abc".to_string())
        );
    }

    #[test]
    fn whitespace_only_never_fires() {
        let mut tracker = flow_tracker();
        assert_eq!(
            tracker.on_snapshot(&TranscriptSnapshot::interim("   ")),
            TrackDecision::Skip
        );
        assert_eq!(
            tracker.on_snapshot(&TranscriptSnapshot::interim("")),
            TrackDecision::Skip
        );
    }

    #[test]
    fn final_event_resets_baseline_in_flow_mode() {
        let mut tracker = flow_tracker();
        tracker.on_snapshot(&TranscriptSnapshot::interim("halo dunia"));
        assert_eq!(
            tracker.on_snapshot(&TranscriptSnapshot::finalized("halo dunia")),
            TrackDecision::Skip
        );
        // Next interim is shorter than the old baseline but still fires:
        // the final event cleared the baseline.
        assert_eq!(
            tracker.on_snapshot(&TranscriptSnapshot::interim("apa")),
            TrackDecision::Partial("apa".to_string())
        );
    }

    #[test]
    fn final_only_policy_fires_on_new_final_segments() {
        let mut tracker = TranscriptTracker::new(TrackPolicy::FinalOnly);
        assert_eq!(
            tracker.on_snapshot(&TranscriptSnapshot::interim("halo")),
            TrackDecision::Skip
        );
        assert_eq!(
            tracker.on_snapshot(&TranscriptSnapshot::finalized("halo dunia ")),
            TrackDecision::Final("halo dunia".to_string())
        );

        // Final text grows monotonically; only the unseen suffix fires.
        let second = TranscriptSnapshot {
            final_text: "halo dunia apa kabar ".to_string(),
            interim_text: String::new(),
            is_final_event: true,
        };
        assert_eq!(
            tracker.on_snapshot(&second),
            TrackDecision::Final("apa kabar".to_string())
        );
    }

    #[test]
    fn reset_clears_baselines() {
        let mut tracker = flow_tracker();
        tracker.on_snapshot(&TranscriptSnapshot::interim("halo dunia"));
        tracker.reset();
        assert_eq!(
            tracker.on_snapshot(&TranscriptSnapshot::interim("apa")),
            TrackDecision::Partial("apa".to_string())
        );
    }
}
