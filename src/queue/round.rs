use rand::seq::SliceRandom;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::{Image, RoundId};

/// Disambiguates rounds built within the same clock tick
static ROUND_SEQUENCE: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RoundError {
    #[error("Invalid choice index {index} (round has {len} choices)")]
    InvalidIndex { index: usize, len: usize },

    #[error("A round needs at least one wrong choice")]
    TooFewChoices,
}

/// One playable question: a photo and a shuffled list of breed names
#[derive(Debug, Clone, Serialize)]
pub struct Round {
    pub id: RoundId,
    pub image: Image,
    pub correct_name: String,
    pub choices: Vec<String>,
    pub created_at: String,
}

impl PartialEq for Round {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Round {}

impl Round {
    /// Build a round from a fetched image and the wrong names to offer next to it
    pub fn new(image: Image, wrong_names: Vec<String>) -> Result<Self, RoundError> {
        if wrong_names.is_empty() {
            return Err(RoundError::TooFewChoices);
        }

        let correct_name = image.display_name();
        let now = chrono::Utc::now();
        let id = round_id(&correct_name, &wrong_names, now.timestamp_nanos_opt());

        let mut choices = Vec::with_capacity(wrong_names.len() + 1);
        choices.push(correct_name.clone());
        choices.extend(wrong_names);
        choices.shuffle(&mut rand::rng());

        Ok(Self {
            id,
            image,
            correct_name,
            choices,
            created_at: now.to_rfc3339(),
        })
    }

    pub fn is_correct(&self, name: &str) -> bool {
        name == self.correct_name
    }

    /// Pick the choice at `index`; returns whether it was the right breed
    pub fn choose(&self, index: usize) -> Result<bool, RoundError> {
        self.choices
            .get(index)
            .map(|choice| self.is_correct(choice))
            .ok_or(RoundError::InvalidIndex {
                index,
                len: self.choices.len(),
            })
    }

    pub fn correct_index(&self) -> usize {
        self.choices
            .iter()
            .position(|choice| self.is_correct(choice))
            .unwrap_or_default()
    }
}

/// Hex SHA-256 over the round content, salted with the build time and a sequence number
fn round_id(correct_name: &str, wrong_names: &[String], timestamp_nanos: Option<i64>) -> RoundId {
    let mut hasher = Sha256::new();
    hasher.update(correct_name.as_bytes());
    for name in wrong_names {
        hasher.update([0u8]);
        hasher.update(name.as_bytes());
    }
    hasher.update([0u8]);
    hasher.update(timestamp_nanos.unwrap_or_default().to_be_bytes());
    hasher.update(ROUND_SEQUENCE.fetch_add(1, Ordering::Relaxed).to_be_bytes());
    hex::encode(hasher.finalize())
}
