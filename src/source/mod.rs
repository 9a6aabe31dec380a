mod dog_api;
mod fake;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::types::{Image, LabelGroup};

pub use dog_api::DogApiSource;
pub use fake::FakeSource;

/// Result type for data source operations
pub type SourceResult<T> = Result<T, SourceError>;

/// Errors that can occur while fetching from a data source
#[derive(Debug, Clone, thiserror::Error)]
pub enum SourceError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Unexpected status code: {0}")]
    Status(u16),

    #[error("No data received")]
    NoData,

    #[error("Response parsing failed: {0}")]
    Decode(String),

    #[error("Source rejected the request: {0}")]
    Rejected(String),
}

/// Remote catalog of labeled dog images
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch one random image together with its label
    async fn fetch_random_image(&self) -> SourceResult<Image>;

    /// Fetch the full catalog of breeds and their sub-breeds
    async fn fetch_label_groups(&self) -> SourceResult<Vec<LabelGroup>>;

    /// Get the name of this source
    fn name(&self) -> &str;
}

/// Which data source implementation to run against
#[derive(Debug, Clone, PartialEq)]
pub enum SourceKind {
    DogApi,
    Fake,
}

/// Configuration for the data source
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub kind: SourceKind,
    /// Base URL of the dog.ceo API
    pub base_url: String,
    /// Timeout for a single request
    pub timeout: Duration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::DogApi,
            base_url: dog_api::DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl SourceConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let kind = match std::env::var("BREEDQUIZ_SOURCE") {
            Ok(value) if value.trim().eq_ignore_ascii_case("fake") => SourceKind::Fake,
            _ => SourceKind::DogApi,
        };

        let base_url = std::env::var("BREEDQUIZ_API_BASE_URL")
            .ok()
            .and_then(|url| {
                let trimmed = url.trim().trim_end_matches('/');
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .unwrap_or(defaults.base_url);

        let timeout = std::env::var("BREEDQUIZ_API_TIMEOUT")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        Self {
            kind,
            base_url,
            timeout,
        }
    }

    /// Build the configured data source
    pub fn build_source(&self) -> SourceResult<Arc<dyn DataSource>> {
        match self.kind {
            SourceKind::DogApi => Ok(Arc::new(DogApiSource::new(
                self.base_url.clone(),
                self.timeout,
            )?)),
            SourceKind::Fake => Ok(Arc::new(FakeSource::new())),
        }
    }
}
