use reqwest::Client;
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when loading items from a source
#[derive(Debug, Error)]
pub enum ItemSourceError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Provider returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Dataset not found: {0}")]
    NotFound(String),

    #[error("Failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed dataset: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ItemSourceError {
    /// Transport failures and upstream 5xx are worth retrying; local data
    /// problems are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ItemSourceError::Request(_) => true,
            ItemSourceError::Upstream { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Item source backed by JSON datasets on local disk.
#[derive(Debug, Clone)]
pub struct LocalItemStore {
    data_dir: PathBuf,
}

impl LocalItemStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load the listings for a provider key from `{data_dir}/{key}.json`.
    ///
    /// The document may carry its items under `listings`, `products` or
    /// `items`; entries without an `id` adopt their `product_id`.
    pub fn load(&self, provider_key: &str) -> Result<Vec<Value>, ItemSourceError> {
        let path = self.data_dir.join(format!("{}.json", provider_key));
        if !path.exists() {
            return Err(ItemSourceError::NotFound(provider_key.to_string()));
        }
        let document: Value = serde_json::from_str(&fs::read_to_string(path)?)?;

        let listings = ["listings", "products", "items"]
            .iter()
            .find_map(|field| document.get(*field))
            .and_then(|value| value.as_array())
            .cloned()
            .unwrap_or_default();

        Ok(listings
            .into_iter()
            .filter(|item| item.is_object())
            .map(normalize_listing)
            .collect())
    }
}

fn normalize_listing(mut item: Value) -> Value {
    if let Some(map) = item.as_object_mut() {
        if !map.contains_key("id") {
            if let Some(product_id) = map.get("product_id").cloned() {
                map.insert("id".to_string(), product_id);
            }
        }
    }
    item
}

/// HTTP client for an external listing provider
///
/// The provider exposes a paged search endpoint; scoring needs a broad
/// sample rather than one provider page, so `fetch_sample` accumulates a
/// deduplicated window of results up to the configured sample size.
pub struct ProviderClient {
    base_url: String,
    api_key: Option<String>,
    client: Client,
    fetch_limit: usize,
    sample_size: usize,
}

impl ProviderClient {
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        fetch_limit: usize,
        sample_size: usize,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(12))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url,
            api_key,
            client,
            fetch_limit: fetch_limit.max(1),
            sample_size: sample_size.max(1),
        }
    }

    /// Fetch one provider page. Returns the page's listings and the total
    /// number of results the provider reports for the query.
    pub async fn fetch_page(
        &self,
        query: &str,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<Value>, usize), ItemSourceError> {
        let url = format!("{}/listings", self.base_url.trim_end_matches('/'));

        let mut request = self.client.get(&url).query(&[
            ("query", query.to_string()),
            ("offset", offset.to_string()),
            ("limit", limit.to_string()),
        ]);
        if let Some(api_key) = &self.api_key {
            request = request.header("X-API-Key", api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ItemSourceError::Upstream {
                status: status.as_u16(),
                body: body.chars().take(300).collect(),
            });
        }

        let document: Value = response.json().await?;
        let listings: Vec<Value> = ["results", "listings", "items"]
            .iter()
            .find_map(|field| document.get(*field))
            .and_then(|value| value.as_array())
            .map(|entries| entries.iter().filter(|e| e.is_object()).cloned().collect())
            .unwrap_or_default();

        let total = document
            .get("total_results")
            .or_else(|| document.get("total"))
            .and_then(|value| value.as_u64())
            .map(|value| value as usize)
            .unwrap_or(listings.len());

        Ok((listings, total))
    }

    /// Accumulate a deduplicated sample of listings for a query, paging
    /// until the sample size is reached or the provider runs out.
    ///
    /// A partial sample is better than none: upstream failure mid-loop
    /// returns what was already fetched, and only a failure on the first
    /// page surfaces as an error.
    pub async fn fetch_sample(&self, query: &str) -> Result<Vec<Value>, ItemSourceError> {
        let mut listings: Vec<Value> = Vec::new();
        let mut seen_ids: HashSet<String> = HashSet::new();
        let mut offset = 0;

        while listings.len() < self.sample_size {
            let page_limit = self.fetch_limit.min(self.sample_size - listings.len());
            let (page, total_available) = match self.fetch_page(query, offset, page_limit).await {
                Ok(result) => result,
                Err(e) if !listings.is_empty() => {
                    tracing::warn!(
                        "Provider fetch failed after {} listings, returning partial sample: {}",
                        listings.len(),
                        e
                    );
                    break;
                }
                Err(e) => return Err(e),
            };

            let returned = page.len();
            if returned == 0 {
                break;
            }
            for item in page {
                if let Some(id) = item.get("id") {
                    let id = id.to_string();
                    if !seen_ids.insert(id) {
                        continue;
                    }
                }
                listings.push(item);
            }
            offset += returned;
            if offset >= total_available {
                break;
            }
        }

        Ok(listings)
    }
}
