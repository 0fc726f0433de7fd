//! Progress reporting and cooperative cancellation.
//!
//! Long-running enumerations accept any [`ProgressTracker`]; they report
//! fractional progress as they sweep hyperplanes and poll for cancellation
//! at safe interruption points.  A cancelled enumeration unwinds cleanly
//! with [`Cancelled`], leaving no partial results behind.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use thiserror::Error;

/// The error produced when an operation observes a cancellation request.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("the operation was cancelled before it completed")]
pub struct Cancelled;

/// A sink for progress reports from a long-running operation.
///
/// Implementations must be safe to share across threads: the operation may
/// report from a worker while the owner polls or cancels from elsewhere.
pub trait ProgressTracker: Send + Sync {
    /// Records `delta` additional progress, as a fraction of the whole
    /// operation in `[0, 1]`.
    fn report_progress(&self, delta: f64);

    /// Has cancellation been requested?
    ///
    /// Operations poll this at interruption points and terminate with
    /// [`Cancelled`] when it returns `true`.
    fn is_cancelled(&self) -> bool;

    /// Marks the operation as finished, successfully or otherwise.
    fn finish(&self);

    /// Returns [`Cancelled`] if cancellation has been requested.
    fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

/// A tracker that ignores progress and never cancels.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullProgress;

impl ProgressTracker for NullProgress {
    fn report_progress(&self, _delta: f64) {}

    fn is_cancelled(&self) -> bool {
        false
    }

    fn finish(&self) {}
}

/// A shareable tracker that accumulates progress and accepts cancellation
/// requests.
///
/// # Examples
///
/// ```
/// use trisurf::enumerate::{ProgressMeter, ProgressTracker};
///
/// let meter = ProgressMeter::new();
/// meter.report_progress(0.25);
/// meter.report_progress(0.25);
/// assert!((meter.fraction() - 0.5).abs() < 1e-12);
/// meter.cancel();
/// assert!(meter.is_cancelled());
/// ```
#[derive(Debug, Default)]
pub struct ProgressMeter {
    // Progress fraction stored as f64 bits.
    fraction: AtomicU64,
    cancelled: AtomicBool,
    finished: AtomicBool,
}

impl ProgressMeter {
    /// Creates a fresh meter at zero progress.
    pub fn new() -> ProgressMeter {
        ProgressMeter::default()
    }

    /// The total fraction of progress reported so far, clamped to `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        f64::from_bits(self.fraction.load(Ordering::Relaxed))
    }

    /// Requests cancellation of the tracked operation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Has the tracked operation called [`ProgressTracker::finish`]?
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Relaxed)
    }
}

impl ProgressTracker for ProgressMeter {
    fn report_progress(&self, delta: f64) {
        let mut current = self.fraction.load(Ordering::Relaxed);
        loop {
            let next = (f64::from_bits(current) + delta).clamp(0.0, 1.0);
            match self.fraction.compare_exchange_weak(
                current,
                next.to_bits(),
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return,
                Err(seen) => current = seen,
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    fn finish(&self) {
        self.finished.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_progress_never_cancels() {
        let p = NullProgress;
        p.report_progress(0.5);
        assert!(!p.is_cancelled());
        assert!(p.check().is_ok());
    }

    #[test]
    fn meter_accumulates_and_clamps() {
        let m = ProgressMeter::new();
        m.report_progress(0.7);
        m.report_progress(0.7);
        assert_eq!(m.fraction(), 1.0);
    }

    #[test]
    fn cancellation_is_observable() {
        let m = ProgressMeter::new();
        assert!(m.check().is_ok());
        m.cancel();
        assert_eq!(m.check(), Err(Cancelled));
        m.finish();
        assert!(m.is_finished());
    }
}
