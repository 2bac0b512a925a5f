//!
//! An optional background worker for best-effort save flushing. Entity
//! mutation itself stays on the loop thread; this follows the same
//! single-worker thread-pool shape used elsewhere for reclaiming orphaned
//! on-disk state off the hot path.
//!

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use threadpool::ThreadPool;

/// A single background worker thread. Not used by [`crate::registry`]
/// directly, but available to a collaborator that wants to fire-and-forget
/// a flush of already-committed records (e.g. an `fsync` sweep) without
/// blocking the loop.
pub static FLUSH_WORKER: Lazy<Mutex<ThreadPool>> = Lazy::new(|| Mutex::new(ThreadPool::new(1)));

/// Queues `job` on the background worker.
pub fn spawn(job: impl FnOnce() + Send + 'static) {
    FLUSH_WORKER.lock().execute(job);
}
