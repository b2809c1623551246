//! Huginn - SLA-bounded caching proxy for slow upstream HTTP endpoints
//!
//! Every client request races a cache lookup against an upstream fetch.
//! A fresh cache hit wins immediately; otherwise the client gets the
//! upstream answer if it arrives within the SLA, or the expired cached
//! entry when the SLA runs out. Upstream answers are written back to the
//! cache even when they arrive late, so the next request is fast.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use huginn::{HttpFetcher, Huginn, MemoryStore, PlacesTransform, Request};
//!
//! #[tokio::main]
//! async fn main() -> huginn::Result<()> {
//!     let fetcher = HttpFetcher::new("https://places.aviasales.ru/v2/places.json")?
//!         .transform(Arc::new(PlacesTransform));
//!
//!     let proxy = Huginn::builder()
//!         .store(Arc::new(MemoryStore::new()))
//!         .fetcher(Arc::new(fetcher))
//!         .sla(Duration::from_secs(3))
//!         .build()?;
//!
//!     let response = proxy.handle(Request::new("?term=Mos&locale=en")).await?;
//!     println!("{} from {}", response.status_code, response.source.as_str());
//!     Ok(())
//! }
//! ```

#[cfg(feature = "client")]
pub mod client;
pub mod error;
pub mod proxy;
#[cfg(any(feature = "server", feature = "client"))]
pub mod server;
pub mod store;
pub mod telemetry;
pub mod types;
pub mod upstream;
pub mod version;

// Re-export main types at crate root
pub use error::{HuginnError, Result};
pub use proxy::{
    CoordinatorConfig, DeadlinePolicy, Huginn, HuginnBuilder, Maintenance, Proxy, RefreshReport,
    RequestCoordinator, Setting,
};
pub use store::{CacheStore, MemoryStore};
#[cfg(feature = "postgres")]
pub use store::{PostgresConfig, PostgresStore};
pub use types::{CacheEntry, FetchOutcome, Request, Response, SaveRequest, Source};
pub use upstream::{HttpFetcher, Identity, PlacesTransform, ResponseTransform, UpstreamFetcher};
pub use version::{PKG_VERSION, version_string};
