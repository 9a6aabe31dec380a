use super::*;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;

pub(super) const DEFAULT_BASE_URL: &str = "https://dog.ceo/api";

/// Status value dog.ceo puts in every successful payload
const SUCCESS_STATUS: &str = "success";

/// dog.ceo HTTP API
pub struct DogApiSource {
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl DogApiSource {
    /// Create a new source against the given base URL (e.g. `https://dog.ceo/api`)
    pub fn new(base_url: String, timeout: Duration) -> SourceResult<Self> {
        reqwest::Url::parse(&base_url).map_err(|e| SourceError::InvalidUrl(e.to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            client,
        })
    }

    /// GET `{base}{path}` and decode a dog.ceo envelope
    async fn get<T: DeserializeOwned>(&self, path: &str) -> SourceResult<T> {
        let url = format!("{}{}", self.base_url, path);

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                SourceError::Timeout(self.timeout)
            } else {
                SourceError::Transport(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(SourceError::Status(response.status().as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        decode_envelope(&bytes)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    message: T,
    status: String,
}

fn decode_envelope<T: DeserializeOwned>(bytes: &[u8]) -> SourceResult<T> {
    if bytes.is_empty() {
        return Err(SourceError::NoData);
    }

    let envelope: Envelope<T> =
        serde_json::from_slice(bytes).map_err(|e| SourceError::Decode(e.to_string()))?;

    if envelope.status != SUCCESS_STATUS {
        return Err(SourceError::Rejected(envelope.status));
    }

    Ok(envelope.message)
}

fn groups_from_catalog(catalog: BTreeMap<String, Vec<String>>) -> Vec<LabelGroup> {
    catalog
        .into_iter()
        .map(|(primary, subs)| LabelGroup::new(primary, subs))
        .collect()
}

#[async_trait]
impl DataSource for DogApiSource {
    async fn fetch_random_image(&self) -> SourceResult<Image> {
        let url: String = self.get("/breeds/image/random").await?;
        if url.trim().is_empty() {
            return Err(SourceError::NoData);
        }
        Ok(Image::from_url(url))
    }

    async fn fetch_label_groups(&self) -> SourceResult<Vec<LabelGroup>> {
        let catalog: BTreeMap<String, Vec<String>> = self.get("/breeds/list/all").await?;
        Ok(groups_from_catalog(catalog))
    }

    fn name(&self) -> &str {
        "dog.ceo"
    }
}
