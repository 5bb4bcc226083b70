//! Request lifecycle tracking.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Lifecycle phases for a page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecyclePhase {
    /// Request handed to the renderer.
    Start,
    /// Response ready to send.
    Completion,
}

/// Timing context for observability.
///
/// Times are measured from the moment the request context was created.
#[derive(Debug, Clone)]
pub struct TimingContext {
    start: Instant,
    marks: HashMap<LifecyclePhase, Instant>,
}

impl TimingContext {
    /// Create a new timing context.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            marks: HashMap::new(),
        }
    }

    /// Record a lifecycle phase. Marking a phase again moves the mark.
    pub fn mark_phase(&mut self, phase: LifecyclePhase) {
        self.marks.insert(phase, Instant::now());
    }

    /// Time from creation to a recorded phase.
    pub fn time_to(&self, phase: LifecyclePhase) -> Option<Duration> {
        self.marks
            .get(&phase)
            .map(|t| t.saturating_duration_since(self.start))
    }
}

impl Default for TimingContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_marks_are_ordered() {
        let mut timing = TimingContext::new();
        timing.mark_phase(LifecyclePhase::Start);
        timing.mark_phase(LifecyclePhase::Completion);

        let start = timing.time_to(LifecyclePhase::Start).unwrap();
        let done = timing.time_to(LifecyclePhase::Completion).unwrap();
        assert!(done >= start);
    }

    #[test]
    fn test_timing_missing_mark() {
        let timing = TimingContext::new();
        assert!(timing.time_to(LifecyclePhase::Completion).is_none());
    }
}
