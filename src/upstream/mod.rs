//! Upstream access: the fetcher contract and its HTTP implementation.

pub mod http;
pub mod transform;

pub use http::HttpFetcher;
pub use transform::{Identity, PlacesTransform, ResponseTransform};

use async_trait::async_trait;

use crate::types::FetchOutcome;

/// Performs exactly one upstream attempt per call.
///
/// Implementations never retry and never return early: every failure is
/// encoded in the returned [`FetchOutcome`].
#[async_trait]
pub trait UpstreamFetcher: Send + Sync {
    async fn fetch(&self, query: &str) -> FetchOutcome;
}
