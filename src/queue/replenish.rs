use futures::stream::{FuturesUnordered, StreamExt};
use rand::seq::IndexedRandom;
use serde::Serialize;
use std::collections::HashSet;

use super::round::Round;
use super::RoundQueue;
use crate::source::SourceError;

/// Why a single fetch-and-build attempt produced no round
#[derive(Debug, thiserror::Error)]
pub(crate) enum AttemptError {
    #[error("Image fetch failed: {0}")]
    Upstream(#[from] SourceError),

    #[error("No eligible wrong breed name for {0}")]
    NoEligibleWrongLabel(String),
}

/// Outcome of one refill batch
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReplenishReport {
    /// The buffer was already at or above the threshold
    pub skipped: bool,
    pub requested: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Attempts dropped once the failure budget ran out
    pub cancelled: usize,
}

/// Pick `count` distinct names from `pool`, none equal to `correct`
pub(crate) fn pick_wrong_names(
    pool: &[String],
    correct: &str,
    count: usize,
) -> Result<Vec<String>, AttemptError> {
    let mut seen = HashSet::new();
    let candidates: Vec<&String> = pool
        .iter()
        .filter(|name| name.as_str() != correct && seen.insert(name.as_str()))
        .collect();

    if count == 0 || candidates.len() < count {
        return Err(AttemptError::NoEligibleWrongLabel(correct.to_string()));
    }

    Ok(candidates
        .choose_multiple(&mut rand::rng(), count)
        .map(|name| (*name).clone())
        .collect())
}

impl RoundQueue {
    /// Top the buffer up if it is below the low-water mark
    pub(crate) async fn replenish(&self) -> ReplenishReport {
        let _guard = self.refill.lock().await;
        self.fill_batch(self.config.min_buffer).await
    }

    /// Run [`RoundQueue::replenish`] on a detached task
    pub(super) fn spawn_replenish(&self) {
        let queue = self.clone();
        tokio::spawn(async move {
            queue.replenish().await;
        });
    }

    /// One refill batch. Caller must hold the refill lock.
    ///
    /// Does nothing if the buffer holds at least `threshold` rounds. Otherwise
    /// runs `max_buffer - len` attempts concurrently, appending each round as
    /// it arrives, and drops every outstanding attempt once `max_failures`
    /// attempts have failed.
    pub(super) async fn fill_batch(&self, threshold: usize) -> ReplenishReport {
        let current = self.buffered().await;
        if current >= threshold {
            return ReplenishReport {
                skipped: true,
                ..ReplenishReport::default()
            };
        }

        let needed = self.config.max_buffer.saturating_sub(current);
        let pool = self.labels.read().await.clone();

        let mut report = ReplenishReport {
            requested: needed,
            ..ReplenishReport::default()
        };

        let mut attempts = FuturesUnordered::new();
        for _ in 0..needed {
            attempts.push(self.build_round(&pool));
        }

        while let Some(outcome) = attempts.next().await {
            match outcome {
                Ok(round) => {
                    self.buffer.write().await.push_back(round);
                    report.succeeded += 1;
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::debug!("Round attempt failed: {}", e);

                    if report.failed >= self.config.max_failures {
                        report.cancelled = attempts.len();
                        tracing::warn!(
                            "Failure budget of {} exhausted, cancelling {} outstanding attempts",
                            self.config.max_failures,
                            report.cancelled
                        );
                        break;
                    }
                }
            }
        }

        tracing::info!(
            "Refill batch: {} requested, {} built, {} failed, {} cancelled",
            report.requested,
            report.succeeded,
            report.failed,
            report.cancelled
        );
        report
    }

    /// Fetch one image and turn it into a round using the given name pool
    async fn build_round(&self, pool: &[String]) -> Result<Round, AttemptError> {
        let image = self.source.fetch_random_image().await?;
        let correct = image.display_name();
        let wrong_names = pick_wrong_names(pool, &correct, self.config.wrong_choices)?;
        Round::new(image, wrong_names).map_err(|_| AttemptError::NoEligibleWrongLabel(correct))
    }

    /// Replace the name pool with a fresh catalog; on failure leave it empty
    pub(super) async fn refresh_labels(&self) {
        match self.source.fetch_label_groups().await {
            Ok(groups) => {
                let names: Vec<String> = groups.iter().flat_map(|g| g.display_names()).collect();
                tracing::debug!(
                    "Fetched {} breed names from {}",
                    names.len(),
                    self.source.name()
                );
                *self.labels.write().await = names;
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to fetch breed names from {}: {}",
                    self.source.name(),
                    e
                );
                self.labels.write().await.clear();
            }
        }
    }
}
