//! Progress reporting for road snapping.
//!
//! Batches may complete on parallel rayon threads, so implementations must
//! be `Send + Sync`.

use std::sync::atomic::{AtomicUsize, Ordering};

use log::info;

/// Trait for receiving progress updates while snapping batches.
pub trait SnapProgress: Send + Sync {
    /// Called once before the first request. `total` is the number of batches.
    fn on_start(&self, total: usize);
    /// Called after each batch finishes, successfully or not.
    fn on_batch_done(&self);
}

/// Ignores all progress.
pub struct NoopProgress;

impl SnapProgress for NoopProgress {
    fn on_start(&self, _total: usize) {}
    fn on_batch_done(&self) {}
}

/// Atomic counters that can be polled from another thread.
#[derive(Debug, Default)]
pub struct AtomicProgressTracker {
    pub completed: AtomicUsize,
    pub total: AtomicUsize,
}

impl AtomicProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(completed, total)` snapshot.
    pub fn snapshot(&self) -> (usize, usize) {
        (
            self.completed.load(Ordering::SeqCst),
            self.total.load(Ordering::SeqCst),
        )
    }
}

impl SnapProgress for AtomicProgressTracker {
    fn on_start(&self, total: usize) {
        self.completed.store(0, Ordering::SeqCst);
        self.total.store(total, Ordering::SeqCst);
    }

    fn on_batch_done(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Logs `[done/total]` after every batch.
#[derive(Debug, Default)]
pub struct LogProgress {
    tracker: AtomicProgressTracker,
}

impl SnapProgress for LogProgress {
    fn on_start(&self, total: usize) {
        self.tracker.on_start(total);
        if total > 0 {
            info!("snapping {} batches to roads", total);
        }
    }

    fn on_batch_done(&self) {
        self.tracker.on_batch_done();
        let (done, total) = self.tracker.snapshot();
        info!("[{}/{}] batches snapped", done, total);
    }
}
