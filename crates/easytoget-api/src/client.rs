use serde::de::DeserializeOwned;
use std::time::Duration;

use tracing::{debug, warn};

use crate::endpoints::{FetchTarget, PageRequest};
use crate::error::{ApiError, Result};
use crate::models::{ContentPage, ContentResponse, HealthStatus};

/// Default port the content API listens on
pub const DEFAULT_API_PORT: u16 = 5001;

const USER_AGENT: &str = concat!("EasyToGet/", env!("CARGO_PKG_VERSION"));

/// Anything that can produce a page of catalog items for a target.
///
/// The HTTP client implements it; tests swap in mocks so feeds can be driven
/// without a server.
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch(&self, target: &FetchTarget, page: Option<PageRequest>) -> Result<ContentPage>;
}

/// HTTP client for the EasyToGet content API
#[derive(Clone)]
pub struct ContentClient {
    client: reqwest::Client,
    base_url: String,
}

impl ContentClient {
    /// Client for `base_url` (e.g. `http://localhost:5001`) with a 10s timeout
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(10))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::InvalidBaseUrl(base_url));
        }

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static(USER_AGENT),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `url` and decode a 2xx JSON body. Returns the status alongside the body.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<(u16, T)> {
        debug!("Fetching from URL: {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            warn!("Content API returned {} for {}", status, url);
            return Err(ApiError::Http {
                status: status.as_u16(),
            });
        }

        // Bytes first so a bad body is a parse error, not a network one
        let bytes = response.bytes().await?;
        let body = serde_json::from_slice(&bytes)?;
        Ok((status.as_u16(), body))
    }

    /// Fetch one listing page
    pub async fn fetch_page(
        &self,
        target: &FetchTarget,
        page: Option<PageRequest>,
    ) -> Result<ContentPage> {
        let url = target.url(&self.base_url, page);
        let (status, body) = self.get_json::<ContentResponse>(&url).await?;
        let page = body.into_page(status)?;

        debug!("Fetched {} items from {}", page.items.len(), url);
        Ok(page)
    }

    /// Whole catalog in one response, no pagination
    pub async fn all(&self) -> Result<ContentPage> {
        let url = format!("{}/content/all", self.base_url);
        let (status, body) = self.get_json::<ContentResponse>(&url).await?;
        body.into_page(status)
    }

    /// `GET /health`
    pub async fn health(&self) -> Result<HealthStatus> {
        let url = format!("{}/health", self.base_url);
        let (status, health) = self.get_json::<HealthStatus>(&url).await?;

        if !health.success {
            return Err(ApiError::Rejected {
                status,
                message: health.message,
            });
        }
        Ok(health)
    }
}

#[async_trait::async_trait]
impl CatalogSource for ContentClient {
    async fn fetch(&self, target: &FetchTarget, page: Option<PageRequest>) -> Result<ContentPage> {
        self.fetch_page(target, page).await
    }
}
