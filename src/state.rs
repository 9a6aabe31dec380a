use std::sync::Arc;
use tokio::sync::RwLock;

use crate::progress::{ProgressSnapshot, ProgressTracker};
use crate::queue::RoundQueue;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub queue: RoundQueue,
    pub progress: Arc<RwLock<ProgressTracker>>,
}

impl AppState {
    pub fn new(queue: RoundQueue) -> Self {
        Self {
            queue,
            progress: Arc::new(RwLock::new(ProgressTracker::new())),
        }
    }

    /// Record one answered round and return the updated counters
    pub async fn record_answer(&self, won: bool) -> ProgressSnapshot {
        let mut progress = self.progress.write().await;
        progress.record(won);
        progress.snapshot()
    }

    pub async fn progress(&self) -> ProgressSnapshot {
        self.progress.read().await.snapshot()
    }

    pub async fn reset_progress(&self) -> ProgressSnapshot {
        let mut progress = self.progress.write().await;
        progress.reset();
        progress.snapshot()
    }
}
