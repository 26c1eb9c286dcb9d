use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of the controller's run counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub admitted: u64,
    pub dropped: u64,
    pub completed: u64,
    pub failed: u64,
    pub cancelled: u64,
    /// Frames admitted after the run worker stopped. Non-zero means the
    /// pipeline can no longer process frames.
    pub lost: u64,
}

impl PipelineStats {
    /// Runs that reached an outcome (success, failure or cancellation).
    pub fn finished(&self) -> u64 {
        self.completed + self.failed + self.cancelled
    }
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    admitted: AtomicU64,
    dropped: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    cancelled: AtomicU64,
    lost: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn admitted(&self) {
        self.admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn cancelled(&self) {
        self.cancelled.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the new lost count.
    pub(crate) fn lost(&self) -> u64 {
        self.lost.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn snapshot(&self) -> PipelineStats {
        PipelineStats {
            admitted: self.admitted.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            lost: self.lost.load(Ordering::Relaxed),
        }
    }
}
