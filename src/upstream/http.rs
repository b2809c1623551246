//! HTTP upstream fetcher.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, error, warn};

use super::UpstreamFetcher;
use super::transform::{Identity, ResponseTransform};
use crate::types::FetchOutcome;
use crate::{HuginnError, Result};

/// Default timeout for one upstream call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches `{base_url}{query}` with a single GET.
///
/// `200 OK` bodies go through the configured [`ResponseTransform`]; any
/// other status is passed through raw with its original status code.
#[derive(Clone)]
pub struct HttpFetcher {
    http: Client,
    base_url: String,
    transform: Arc<dyn ResponseTransform>,
}

impl HttpFetcher {
    /// Create a fetcher with the identity transform and default timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a fetcher with a custom per-call timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HuginnError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            transform: Arc::new(Identity),
        })
    }

    /// Replace the response transform.
    pub fn transform(mut self, transform: Arc<dyn ResponseTransform>) -> Self {
        self.transform = transform;
        self
    }

    /// The upstream base address.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl UpstreamFetcher for HttpFetcher {
    async fn fetch(&self, query: &str) -> FetchOutcome {
        let url = format!("{}{}", self.base_url, query);
        debug!(%url, "calling upstream endpoint");

        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                error!(%url, error = %e, "error while calling upstream endpoint");
                return FetchOutcome::unavailable();
            }
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                error!(%url, error = %e, "error reading upstream response body");
                return FetchOutcome::unavailable();
            }
        };

        if status != StatusCode::OK {
            warn!(%url, status = status.as_u16(), "passing through non-OK upstream response");
            return FetchOutcome::success(body.to_vec(), status.as_u16());
        }

        match self.transform.transform(&body) {
            Ok(payload) => FetchOutcome::success(payload, status.as_u16()),
            Err(e) => {
                error!(%url, error = %e, "cannot transform upstream response");
                FetchOutcome::failure(StatusCode::BAD_GATEWAY.as_u16(), e)
            }
        }
    }
}
