//! Coalesced batch progress reporting.

use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub completed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub running: usize,
    pub pending: usize,
    pub total: usize,
    pub elapsed: Duration,
}

impl ProgressSnapshot {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.completed as f64 / self.total as f64 * 100.0
        }
    }
}

/// Host callback receiving coalesced snapshots
pub type ProgressCallback = Box<dyn FnMut(&ProgressSnapshot) + Send>;

/// Emits at most one update per interval, plus a final one.
pub struct ProgressTracker {
    interval: Duration,
    last_emit: Option<Instant>,
    last_completed: Option<usize>,
    callback: Option<ProgressCallback>,
}

impl ProgressTracker {
    pub fn new(interval: Duration, callback: Option<ProgressCallback>) -> Self {
        Self {
            interval,
            last_emit: None,
            last_completed: None,
            callback,
        }
    }

    /// Report if the interval has elapsed since the last update and the
    /// completion count moved. Returns whether a report was emitted.
    pub fn maybe_report(&mut self, snapshot: ProgressSnapshot, now: Instant) -> bool {
        let due = self
            .last_emit
            .map_or(true, |t| now.duration_since(t) >= self.interval);
        if !due || self.last_completed == Some(snapshot.completed) {
            return false;
        }
        self.emit(snapshot, now);
        true
    }

    /// Unconditional final report
    pub fn finish(&mut self, snapshot: ProgressSnapshot) {
        self.emit(snapshot, Instant::now());
    }

    /// Hand the callback back for the next run
    pub fn into_callback(self) -> Option<ProgressCallback> {
        self.callback
    }

    fn emit(&mut self, snapshot: ProgressSnapshot, now: Instant) {
        info!(
            completed = snapshot.completed,
            total = snapshot.total,
            succeeded = snapshot.succeeded,
            failed = snapshot.failed,
            running = snapshot.running,
            pct = snapshot.percent(),
            "Batch progress"
        );
        if let Some(cb) = self.callback.as_mut() {
            cb(&snapshot);
        }
        self.last_emit = Some(now);
        self.last_completed = Some(snapshot.completed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn snap(completed: usize) -> ProgressSnapshot {
        ProgressSnapshot {
            completed,
            succeeded: completed,
            failed: 0,
            running: 1,
            pending: 10 - completed,
            total: 10,
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn test_updates_are_coalesced() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut tracker = ProgressTracker::new(
            Duration::from_secs(5),
            Some(Box::new(move |s: &ProgressSnapshot| sink.lock().unwrap().push(s.completed))),
        );
        let t0 = Instant::now();
        assert!(tracker.maybe_report(snap(1), t0));
        assert!(!tracker.maybe_report(snap(2), t0 + Duration::from_secs(1)));
        assert!(!tracker.maybe_report(snap(3), t0 + Duration::from_secs(4)));
        assert!(tracker.maybe_report(snap(4), t0 + Duration::from_secs(6)));
        // Nothing new completed: suppressed even though the interval passed
        assert!(!tracker.maybe_report(snap(4), t0 + Duration::from_secs(20)));
        tracker.finish(snap(10));
        assert_eq!(*seen.lock().unwrap(), vec![1, 4, 10]);
    }

    #[test]
    fn test_percent() {
        assert!((snap(5).percent() - 50.0).abs() < 1e-9);
    }
}
