//! Runtime statistics of a [`crate::RegexObject`].
//!
//! The profile decides two things: whether it is worth building the full
//! automaton of a pattern, and whether capture groups should be computed
//! while searching instead of on demand. Counters are plain atomics; the
//! two running means are updated independently and may briefly lag each
//! other under concurrent use.

use std::sync::atomic::{AtomicU64, Ordering};

/// Calls between two re-evaluations of the heuristics.
pub const EVALUATION_TRIP_POINT: u64 = 800;

/// Calls after which generating the full automaton pays off.
pub const GENERATE_DFA_THRESHOLD: u64 = 100;

const EAGER_MATCH_RATIO: f64 = 0.5;
const EAGER_CG_ACCESS_RATIO: f64 = 0.5;
const EAGER_MATCHED_PORTION: f64 = 0.4;

/// An `f64` stored as its bits.
#[derive(Debug, Default)]
struct AtomicMean(AtomicU64);

impl AtomicMean {
    fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn set(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Fold the `n`-th sample into the mean.
    fn update(&self, sample: f64, n: u64) {
        let n = n.max(1) as f64;
        let _ = self
            .0
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
                let mean = f64::from_bits(bits);
                Some((mean + (sample - mean) / n).to_bits())
            });
    }
}

#[derive(Debug, Default)]
pub struct RegexProfile {
    calls: AtomicU64,
    matches: AtomicU64,
    capture_group_accesses: AtomicU64,
    avg_match_length: AtomicMean,
    avg_matched_portion: AtomicMean,
}

impl RegexProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn matches(&self) -> u64 {
        self.matches.load(Ordering::Relaxed)
    }

    pub fn capture_group_accesses(&self) -> u64 {
        self.capture_group_accesses.load(Ordering::Relaxed)
    }

    pub fn avg_match_length(&self) -> f64 {
        self.avg_match_length.get()
    }

    /// Mean share of the searched text covered by the match.
    pub fn avg_matched_portion(&self) -> f64 {
        self.avg_matched_portion.get()
    }

    /// Count one execution. Returns the new call count.
    pub fn record_call(&self) -> u64 {
        self.calls.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Count one successful execution. `traversed` is the number of bytes
    /// between the search start and the match end.
    pub fn record_match(&self, match_length: usize, traversed: usize) {
        let n = self.matches.fetch_add(1, Ordering::Relaxed) + 1;
        let portion = if traversed == 0 {
            1.0
        } else {
            match_length as f64 / traversed as f64
        };
        self.avg_match_length.update(match_length as f64, n);
        self.avg_matched_portion.update(portion, n);
    }

    pub fn record_capture_group_access(&self) {
        self.capture_group_accesses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn at_evaluation_trip_point(&self) -> bool {
        let calls = self.calls();
        calls > 0 && calls % EVALUATION_TRIP_POINT == 0
    }

    pub fn should_generate_full_automaton(&self) -> bool {
        self.calls() >= GENERATE_DFA_THRESHOLD
    }

    pub fn should_use_eager_capture_groups(&self) -> bool {
        let calls = self.calls();
        let matches = self.matches();
        if calls == 0 || matches == 0 {
            return false;
        }
        let match_ratio = matches as f64 / calls as f64;
        let access_ratio = self.capture_group_accesses() as f64 / matches as f64;
        match_ratio > EAGER_MATCH_RATIO
            && access_ratio > EAGER_CG_ACCESS_RATIO
            && self.avg_matched_portion() > EAGER_MATCHED_PORTION
    }

    pub fn reset(&self) {
        self.calls.store(0, Ordering::Relaxed);
        self.matches.store(0, Ordering::Relaxed);
        self.capture_group_accesses.store(0, Ordering::Relaxed);
        self.avg_match_length.set(0.0);
        self.avg_matched_portion.set(0.0);
    }

    #[cfg(test)]
    fn with_counts(calls: u64, matches: u64, accesses: u64, portion: f64) -> Self {
        let profile = Self::new();
        profile.calls.store(calls, Ordering::Relaxed);
        profile.matches.store(matches, Ordering::Relaxed);
        profile.capture_group_accesses.store(accesses, Ordering::Relaxed);
        profile.avg_matched_portion.set(portion);
        profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trip_point() {
        let profile = RegexProfile::new();
        assert!(!profile.at_evaluation_trip_point());
        for _ in 0..799 {
            profile.record_call();
        }
        assert!(!profile.at_evaluation_trip_point());
        profile.record_call();
        assert!(profile.at_evaluation_trip_point());
        profile.record_call();
        assert!(!profile.at_evaluation_trip_point());
    }

    #[test]
    fn eager_capture_groups() {
        assert!(RegexProfile::with_counts(1000, 600, 400, 0.5).should_use_eager_capture_groups());
        assert!(!RegexProfile::with_counts(1000, 600, 100, 0.5).should_use_eager_capture_groups());
        assert!(!RegexProfile::with_counts(1000, 400, 400, 0.5).should_use_eager_capture_groups());
        assert!(!RegexProfile::with_counts(1000, 600, 400, 0.3).should_use_eager_capture_groups());
        assert!(!RegexProfile::new().should_use_eager_capture_groups());
    }

    #[test]
    fn full_automaton_threshold() {
        let profile = RegexProfile::with_counts(GENERATE_DFA_THRESHOLD - 1, 0, 0, 0.0);
        assert!(!profile.should_generate_full_automaton());
        profile.record_call();
        assert!(profile.should_generate_full_automaton());
        profile.reset();
        assert!(!profile.should_generate_full_automaton());
    }

    #[test]
    fn running_means() {
        let profile = RegexProfile::new();
        profile.record_match(2, 4);
        profile.record_match(4, 4);
        profile.record_match(0, 0);
        assert_eq!(profile.matches(), 3);
        assert!((profile.avg_match_length() - 2.0).abs() < 1e-9);
        assert!((profile.avg_matched_portion() - 2.5 / 3.0).abs() < 1e-9);
    }
}
