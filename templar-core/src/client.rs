//! Catalog client - read-through cache over the published artifact
//!
//! The client fetches `{base_url}/api/templates.json`, keeps the last good
//! snapshot for a freshness window and answers queries from it. Transport
//! is abstracted behind [`Fetcher`] so the cache can be exercised without a
//! network:
//! - [`HttpFetcher`] (reqwest, behind the `client` feature)
//! - Mock (testing)

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::{API_PATH, DEFAULT_CACHE_TTL};
#[cfg(feature = "client")]
use crate::config::{CatalogConfig, DEFAULT_BASE_URL};
use crate::error::{CatalogError, Result};
use crate::model::{Category, Template, TemplatesApi};

/// Status and body of a completed request
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport used by [`CatalogClient`]
///
/// Implementations return any response the server produced, successful or
/// not. Only failures to obtain a response at all are errors.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET `url` and return the whole body
    async fn get(&self, url: &str) -> Result<FetchResponse>;

    /// Transport identifier for logging
    fn name(&self) -> &'static str;
}

/// reqwest-backed transport
#[cfg(feature = "client")]
pub struct HttpFetcher {
    client: reqwest::Client,
}

#[cfg(feature = "client")]
impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("templar/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CatalogError::Transport {
                url: String::new(),
                message: format!("Failed to create HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }
}

#[cfg(feature = "client")]
#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<FetchResponse> {
        let transport = |e: reqwest::Error| CatalogError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self.client.get(url).send().await.map_err(transport)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(transport)?;

        Ok(FetchResponse {
            status,
            body: body.to_vec(),
        })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// A fetched artifact and when it was captured
///
/// Stored as one value so the snapshot and its timestamp are always
/// replaced together.
struct CachedSnapshot {
    api: Arc<TemplatesApi>,
    captured_at: Instant,
}

/// Fetches and queries a published template catalog
pub struct CatalogClient {
    base_url: String,
    fetcher: Box<dyn Fetcher>,
    cache_ttl: Duration,
    cache: Mutex<Option<CachedSnapshot>>,
}

impl CatalogClient {
    /// Client for `base_url` using the HTTP transport
    #[cfg(feature = "client")]
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self::with_fetcher(base_url, Box::new(HttpFetcher::new()?)))
    }

    /// Client for the public catalog
    #[cfg(feature = "client")]
    pub fn public() -> Result<Self> {
        Self::new(DEFAULT_BASE_URL)
    }

    /// Client over a custom transport
    pub fn with_fetcher(base_url: impl Into<String>, fetcher: Box<dyn Fetcher>) -> Self {
        Self {
            base_url: base_url.into(),
            fetcher,
            cache_ttl: DEFAULT_CACHE_TTL,
            cache: Mutex::new(None),
        }
    }

    /// HTTP client using the configured base URL and freshness window
    #[cfg(feature = "client")]
    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        Ok(Self::new(config.base_url.clone())?.with_cache_ttl(config.cache_ttl()))
    }

    /// Override the freshness window
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of the artifact this client reads
    pub fn api_url(&self) -> String {
        format!("{}/{API_PATH}", self.base_url.trim_end_matches('/'))
    }

    /// Return the catalog, from cache when fresh and `use_cache` is set
    ///
    /// A stale or bypassed cache triggers exactly one request. On failure the
    /// previous snapshot is left in place.
    pub async fn get_templates(&self, use_cache: bool) -> Result<Arc<TemplatesApi>> {
        if use_cache {
            if let Some(api) = self.fresh_snapshot() {
                debug!("Using cached catalog from {}", self.base_url);
                return Ok(api);
            }
        }

        let url = self.api_url();
        debug!("Fetching catalog from {} via {}", url, self.fetcher.name());

        let response = self.fetcher.get(&url).await?;
        if !response.is_success() {
            return Err(CatalogError::Retrieval {
                url,
                status: response.status,
            });
        }

        let api: TemplatesApi = serde_json::from_slice(&response.body)
            .map_err(|source| CatalogError::Decode { url, source })?;
        let api = Arc::new(api);

        *self.lock_cache() = Some(CachedSnapshot {
            api: Arc::clone(&api),
            captured_at: Instant::now(),
        });

        Ok(api)
    }

    /// Templates in one category; empty when the category is unknown
    pub async fn get_templates_by_category(&self, category_id: &str) -> Result<Vec<Template>> {
        let api = self.get_templates(true).await?;
        Ok(api.templates_in(category_id).to_vec())
    }

    /// Case-insensitive search across every category
    pub async fn search_templates(&self, query: &str) -> Result<Vec<Template>> {
        let api = self.get_templates(true).await?;
        Ok(api.search(query).into_iter().cloned().collect())
    }

    /// Categories of the artifact, without their templates
    pub async fn get_categories(&self) -> Result<Vec<Category>> {
        let api = self.get_templates(true).await?;
        Ok(api.categories())
    }

    /// Fetch a template's archive bytes
    pub async fn download_template(&self, template: &Template) -> Result<Vec<u8>> {
        debug!("Downloading template '{}' from {}", template.id, template.download_url);

        let response = self.fetcher.get(&template.download_url).await?;
        if !response.is_success() {
            return Err(CatalogError::Retrieval {
                url: template.download_url.clone(),
                status: response.status,
            });
        }
        Ok(response.body)
    }

    /// Drop the cached snapshot so the next read fetches
    pub fn clear_cache(&self) {
        *self.lock_cache() = None;
    }

    fn fresh_snapshot(&self) -> Option<Arc<TemplatesApi>> {
        self.lock_cache()
            .as_ref()
            .filter(|snapshot| snapshot.captured_at.elapsed() < self.cache_ttl)
            .map(|snapshot| Arc::clone(&snapshot.api))
    }

    // Holders never panic mid-update, so a poisoned snapshot is still whole
    fn lock_cache(&self) -> MutexGuard<'_, Option<CachedSnapshot>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Mock transport for testing
#[cfg(test)]
pub struct MockFetcher {
    pub responses: std::collections::HashMap<String, FetchResponse>,
    pub calls: Arc<std::sync::atomic::AtomicUsize>,
}

#[cfg(test)]
#[async_trait]
impl Fetcher for MockFetcher {
    async fn get(&self, url: &str) -> Result<FetchResponse> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(self.responses.get(url).cloned().unwrap_or(FetchResponse {
            status: 404,
            body: Vec::new(),
        }))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
