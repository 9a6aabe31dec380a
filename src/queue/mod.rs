//! Prefetching round queue
//!
//! Keeps a buffer of ready-to-play rounds above a low-water mark by fetching
//! images from a [`DataSource`] concurrently. Callers asking for rounds while
//! the buffer is healthy never wait on the network; a depleted buffer makes
//! them wait for a refill instead of starving.

mod replenish;
mod round;

use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::source::DataSource;

pub use replenish::ReplenishReport;
pub use round::{Round, RoundError};

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// Fewer rounds than requested were available even after a refill.
    /// `partial` holds the rounds that were handed out anyway.
    #[error("Requested {requested} rounds but only {available} are available")]
    InsufficientSupply {
        requested: usize,
        available: usize,
        partial: Vec<Round>,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Buffer sizing and failure budget
#[derive(Debug, Clone, PartialEq)]
pub struct QueueConfig {
    /// Low-water mark: a refill starts when the buffer drops below this
    pub min_buffer: usize,
    /// High-water mark a refill tops the buffer up to
    pub max_buffer: usize,
    /// Failed attempts after which a refill batch gives up
    pub max_failures: usize,
    /// Wrong names offered next to the correct one
    pub wrong_choices: usize,
    /// Refill passes `reset` runs before leaving the rest to the low-water trigger
    pub reset_refill_passes: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            min_buffer: 20,
            max_buffer: 30,
            max_failures: 5,
            wrong_choices: 1,
            reset_refill_passes: 1,
        }
    }
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

impl QueueConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            min_buffer: env_usize("BREEDQUIZ_MIN_BUFFER").unwrap_or(defaults.min_buffer),
            max_buffer: env_usize("BREEDQUIZ_MAX_BUFFER").unwrap_or(defaults.max_buffer),
            max_failures: env_usize("BREEDQUIZ_MAX_FAILURES").unwrap_or(defaults.max_failures),
            wrong_choices: env_usize("BREEDQUIZ_WRONG_CHOICES")
                .unwrap_or(defaults.wrong_choices),
            reset_refill_passes: env_usize("BREEDQUIZ_RESET_REFILL_PASSES")
                .unwrap_or(defaults.reset_refill_passes),
        }
    }

    pub fn validate(&self) -> QueueResult<()> {
        if self.max_buffer == 0 {
            return Err(QueueError::Config("max_buffer must be positive".to_string()));
        }
        if self.min_buffer > self.max_buffer {
            return Err(QueueError::Config(format!(
                "min_buffer ({}) exceeds max_buffer ({})",
                self.min_buffer, self.max_buffer
            )));
        }
        if self.max_failures == 0 {
            return Err(QueueError::Config(
                "max_failures must be positive".to_string(),
            ));
        }
        if self.wrong_choices == 0 {
            return Err(QueueError::Config(
                "wrong_choices must be positive".to_string(),
            ));
        }
        if self.reset_refill_passes == 0 {
            return Err(QueueError::Config(
                "reset_refill_passes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Owner of the round buffer and the pool of valid breed names.
///
/// Clones share the same buffer, pool and locks, which is how background
/// refills spawned by [`RoundQueue::next_rounds`] reach the state.
#[derive(Clone)]
pub struct RoundQueue {
    source: Arc<dyn DataSource>,
    config: QueueConfig,
    buffer: Arc<RwLock<VecDeque<Round>>>,
    labels: Arc<RwLock<Vec<String>>>,
    /// Held for the whole of a refill or reset; at most one runs at a time
    refill: Arc<Mutex<()>>,
}

impl RoundQueue {
    /// Create a queue and fill it before returning.
    ///
    /// A failing catalog fetch does not fail construction; the queue then
    /// simply cannot build rounds until the next successful `reset`.
    pub async fn new(source: Arc<dyn DataSource>, config: QueueConfig) -> QueueResult<Self> {
        config.validate()?;

        let queue = Self {
            source,
            config,
            buffer: Arc::new(RwLock::new(VecDeque::new())),
            labels: Arc::new(RwLock::new(Vec::new())),
            refill: Arc::new(Mutex::new(())),
        };

        queue.reset().await;
        Ok(queue)
    }

    /// Take `count` rounds from the front of the buffer.
    ///
    /// With more than `count` rounds buffered this returns immediately and
    /// tops the buffer up in the background. Otherwise it refills first and
    /// fails with [`QueueError::InsufficientSupply`] if the refill fell short.
    pub async fn next_rounds(&self, count: usize) -> QueueResult<Vec<Round>> {
        {
            let mut buffer = self.buffer.write().await;
            if buffer.len() > count {
                let rounds: Vec<Round> = buffer.drain(..count).collect();
                drop(buffer);
                self.spawn_replenish();
                return Ok(rounds);
            }
        }

        self.replenish().await;

        let mut buffer = self.buffer.write().await;
        let available = count.min(buffer.len());
        let rounds: Vec<Round> = buffer.drain(..available).collect();
        drop(buffer);

        if rounds.len() < count {
            tracing::warn!(
                "Round supply short: requested {}, available {}",
                count,
                rounds.len()
            );
            return Err(QueueError::InsufficientSupply {
                requested: count,
                available: rounds.len(),
                partial: rounds,
            });
        }

        Ok(rounds)
    }

    /// Drop every buffered round and the label pool, then rebuild both
    pub async fn reset(&self) {
        let _guard = self.refill.lock().await;

        self.buffer.write().await.clear();
        self.labels.write().await.clear();
        self.refresh_labels().await;

        // Reset passes top up to the high-water mark, not just past the low one
        for pass in 1..=self.config.reset_refill_passes {
            let report = self.fill_batch(self.config.max_buffer).await;
            let buffered = self.buffered().await;
            tracing::debug!("Reset refill pass {}: {:?}", pass, report);

            if report.skipped || report.succeeded == 0 || buffered >= self.config.max_buffer {
                break;
            }
        }

        tracing::info!(
            "Round queue reset: {} rounds buffered, {} breed names known",
            self.buffered().await,
            self.labels.read().await.len()
        );
    }

    /// Number of rounds currently buffered
    pub async fn buffered(&self) -> usize {
        self.buffer.read().await.len()
    }

    /// Snapshot of the known breed names
    pub async fn label_pool(&self) -> Vec<String> {
        self.labels.read().await.clone()
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }
}
