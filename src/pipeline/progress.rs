// src/pipeline/progress.rs

//! Progress reporting for long-running batches.
//!
//! Units of a batch run concurrently, so reporters take `&self` and keep
//! their counters in atomics.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Receives batch lifecycle events.
pub trait ProgressReporter: Send + Sync {
    /// Called once before any unit starts.
    fn begin(&self, _total: usize) {}

    /// Called exactly once per finished unit, whatever its outcome.
    fn advance(&self) {}

    /// Called after the last unit.
    fn finish(&self) {}
}

/// Logs `done/total`, elapsed time and an estimate of the remaining time.
pub struct LogProgress {
    label: String,
    total: AtomicUsize,
    done: AtomicUsize,
    started: Mutex<Option<Instant>>,
}

impl LogProgress {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            total: AtomicUsize::new(0),
            done: AtomicUsize::new(0),
            started: Mutex::new(None),
        }
    }

    /// Units finished so far.
    pub fn done(&self) -> usize {
        self.done.load(Ordering::SeqCst)
    }

    fn elapsed(&self) -> Duration {
        self.started
            .lock()
            .ok()
            .and_then(|started| started.map(|t| t.elapsed()))
            .unwrap_or_default()
    }

    /// Log every tenth of the batch, and the last unit.
    fn should_log(done: usize, total: usize) -> bool {
        let step = (total / 10).max(1);
        done == total || done % step == 0
    }
}

impl ProgressReporter for LogProgress {
    fn begin(&self, total: usize) {
        self.total.store(total, Ordering::SeqCst);
        self.done.store(0, Ordering::SeqCst);
        if let Ok(mut started) = self.started.lock() {
            *started = Some(Instant::now());
        }
        log::info!("{}: {} items", self.label, total);
    }

    fn advance(&self) {
        let done = self.done.fetch_add(1, Ordering::SeqCst) + 1;
        let total = self.total.load(Ordering::SeqCst);
        if !Self::should_log(done, total) {
            return;
        }

        let elapsed = self.elapsed();
        let remaining = total.saturating_sub(done);
        let eta = elapsed.mul_f64(remaining as f64 / done as f64);
        log::info!(
            "{}: {}/{} ({:.1}s elapsed, ~{:.1}s left)",
            self.label,
            done,
            total,
            elapsed.as_secs_f64(),
            eta.as_secs_f64()
        );
    }

    fn finish(&self) {
        log::info!(
            "{}: finished {} items in {:.1}s",
            self.label,
            self.done(),
            self.elapsed().as_secs_f64()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_progress_counts() {
        let progress = LogProgress::new("details");
        progress.begin(3);
        progress.advance();
        progress.advance();
        progress.advance();
        progress.finish();
        assert_eq!(progress.done(), 3);
    }

    #[test]
    fn test_should_log_steps() {
        assert!(LogProgress::should_log(10, 100));
        assert!(!LogProgress::should_log(11, 100));
        assert!(LogProgress::should_log(100, 100));
        assert!(LogProgress::should_log(1, 3));
    }
}
