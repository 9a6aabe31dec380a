use super::*;
use crate::types::Label;
use rand::seq::IndexedRandom;
use rand::Rng;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};

const FAKE_IMAGES: &[(&str, &str, Option<&str>)] = &[
    (
        "https://images.dog.ceo/breeds/hound-afghan/n02088094_1003.jpg",
        "hound",
        Some("afghan"),
    ),
    (
        "https://images.dog.ceo/breeds/bulldog-boston/n02096585_1023.jpg",
        "bulldog",
        Some("boston"),
    ),
    (
        "https://images.dog.ceo/breeds/retriever-golden/n02099601_1001.jpg",
        "retriever",
        Some("golden"),
    ),
    (
        "https://images.dog.ceo/breeds/labrador/n02099712_1001.jpg",
        "labrador",
        None,
    ),
    (
        "https://images.dog.ceo/breeds/poodle/n02113799_1001.jpg",
        "poodle",
        None,
    ),
    (
        "https://images.dog.ceo/breeds/dalmatian/cooper1.jpg",
        "dalmatian",
        None,
    ),
    (
        "https://images.dog.ceo/breeds/setter-gordon/n02101006_3062.jpg",
        "setter",
        Some("gordon"),
    ),
    (
        "https://images.dog.ceo/breeds/deerhound-scottish/n02092002_5152.jpg",
        "deerhound",
        Some("scottish"),
    ),
    (
        "https://images.dog.ceo/breeds/elkhound-norwegian/n02091467_815.jpg",
        "elkhound",
        Some("norwegian"),
    ),
    (
        "https://images.dog.ceo/breeds/sheepdog-indian/Himalayan_Sheepdog.jpg",
        "sheepdog",
        Some("indian"),
    ),
];

/// In-memory source over a fixed set of dog.ceo images.
///
/// Failure and latency can be dialed in so the round queue can be exercised
/// without a network.
pub struct FakeSource {
    images: Vec<Image>,
    groups: Vec<LabelGroup>,
    images_broken: bool,
    labels_broken: bool,
    /// Number of image fetches (counted from the first) that fail
    failing_image_fetches: usize,
    /// Random latency per call, in milliseconds
    delay_ms: Option<Range<u64>>,
    images_started: AtomicUsize,
    images_completed: AtomicUsize,
    label_fetches: AtomicUsize,
}

impl Default for FakeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeSource {
    pub fn new() -> Self {
        let images = FAKE_IMAGES
            .iter()
            .map(|(url, primary, sub)| Image::new(*url, Label::new(primary, *sub)))
            .collect();

        let groups = FAKE_IMAGES
            .iter()
            .map(|(_, primary, sub)| {
                LabelGroup::new(*primary, sub.iter().map(|s| s.to_string()).collect())
            })
            .collect();

        Self {
            images,
            groups,
            images_broken: false,
            labels_broken: false,
            failing_image_fetches: 0,
            delay_ms: None,
            images_started: AtomicUsize::new(0),
            images_completed: AtomicUsize::new(0),
            label_fetches: AtomicUsize::new(0),
        }
    }

    /// Every image fetch fails
    pub fn with_broken_images(mut self) -> Self {
        self.images_broken = true;
        self
    }

    /// Every catalog fetch fails
    pub fn with_broken_labels(mut self) -> Self {
        self.labels_broken = true;
        self
    }

    /// The first `count` image fetches fail, later ones succeed
    pub fn with_failing_image_fetches(mut self, count: usize) -> Self {
        self.failing_image_fetches = count;
        self
    }

    /// Sleep a random duration from `range_ms` before answering each call
    pub fn with_random_delay(mut self, range_ms: Range<u64>) -> Self {
        self.delay_ms = (!range_ms.is_empty()).then_some(range_ms);
        self
    }

    /// Replace the catalog served by `fetch_label_groups`
    pub fn with_groups(mut self, groups: Vec<LabelGroup>) -> Self {
        self.groups = groups;
        self
    }

    /// Image fetches that have been started
    pub fn image_fetches_started(&self) -> usize {
        self.images_started.load(Ordering::SeqCst)
    }

    /// Image fetches that ran to completion (not cancelled mid-flight)
    pub fn image_fetches_completed(&self) -> usize {
        self.images_completed.load(Ordering::SeqCst)
    }

    pub fn label_fetches(&self) -> usize {
        self.label_fetches.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        if let Some(range) = &self.delay_ms {
            let millis = rand::rng().random_range(range.clone());
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
    }
}

#[async_trait]
impl DataSource for FakeSource {
    async fn fetch_random_image(&self) -> SourceResult<Image> {
        let call = self.images_started.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        self.images_completed.fetch_add(1, Ordering::SeqCst);

        if self.images_broken || call < self.failing_image_fetches {
            return Err(SourceError::NoData);
        }

        self.images
            .choose(&mut rand::rng())
            .cloned()
            .ok_or(SourceError::NoData)
    }

    async fn fetch_label_groups(&self) -> SourceResult<Vec<LabelGroup>> {
        self.label_fetches.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if self.labels_broken {
            return Err(SourceError::NoData);
        }
        Ok(self.groups.clone())
    }

    fn name(&self) -> &str {
        "fake"
    }
}
