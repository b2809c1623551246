//! [`AdminClient`]: reqwest wrapper around the `/admin/*` routes.

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;

use crate::server::convert::{EntryView, ErrorView, HealthView};
use crate::{HuginnError, RefreshReport, Result, Setting};

/// Typed client for a remote hugd admin listener.
pub struct AdminClient {
    http: Client,
    base_url: String,
}

impl AdminClient {
    /// Create a client for the admin listener at `base_url`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let client = AdminClient::new("http://127.0.0.1:8081");
    /// let top = client.top(5).await?;
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The `n` most popular entries.
    pub async fn top(&self, n: usize) -> Result<Vec<EntryView>> {
        self.call(Method::GET, &format!("/admin/top?n={n}")).await
    }

    /// The `n` least popular entries.
    pub async fn bottom(&self, n: usize) -> Result<Vec<EntryView>> {
        self.call(Method::GET, &format!("/admin/bottom?n={n}")).await
    }

    pub async fn entries(&self) -> Result<Vec<EntryView>> {
        self.call(Method::GET, "/admin/entries").await
    }

    pub async fn settings(&self) -> Result<Vec<Setting>> {
        self.call(Method::GET, "/admin/settings").await
    }

    /// Delete every entry.
    pub async fn clean(&self) -> Result<()> {
        self.send(Method::POST, "/admin/clean").await.map(|_| ())
    }

    /// Re-fetch every key from upstream.
    pub async fn refresh(&self) -> Result<RefreshReport> {
        self.call(Method::POST, "/admin/refresh").await
    }

    /// Health report. An unhealthy daemon answers 503 with a body, which is
    /// returned rather than treated as an error.
    pub async fn health(&self) -> Result<HealthView> {
        let response = self.request(Method::GET, "/admin/health").await?;
        let status = response.status();
        if status.is_success() || status == StatusCode::SERVICE_UNAVAILABLE {
            let body = response.bytes().await.map_err(transport_error)?;
            return Ok(serde_json::from_slice(&body)?);
        }
        Err(api_error(response).await)
    }

    async fn call<T: DeserializeOwned>(&self, method: Method, path: &str) -> Result<T> {
        let response = self.send(method, path).await?;
        let body = response.bytes().await.map_err(transport_error)?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn send(&self, method: Method, path: &str) -> Result<reqwest::Response> {
        let response = self.request(method, path).await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(api_error(response).await)
        }
    }

    async fn request(&self, method: Method, path: &str) -> Result<reqwest::Response> {
        let url = format!("{}{path}", self.base_url);
        self.http
            .request(method, &url)
            .send()
            .await
            .map_err(|e| HuginnError::Http(format!("failed to reach {url}: {e}")))
    }
}

fn transport_error(err: reqwest::Error) -> HuginnError {
    HuginnError::Http(err.to_string())
}

async fn api_error(response: reqwest::Response) -> HuginnError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorView>(&text)
        .map(|view| view.error)
        .unwrap_or(text);
    HuginnError::Api { status, message }
}
