//! HTTP frontends and daemon wiring.
//!
//! This module provides:
//! - Wire types shared by the admin routes and the admin client (`convert`)
//! - The client and admin axum routers (`routes`, server-only)
//! - Configuration types (`config`, server-only)

#[cfg(feature = "server")]
pub mod config;
pub mod convert;
#[cfg(feature = "server")]
pub mod routes;

#[cfg(feature = "server")]
pub use routes::{admin_router, client_router};

#[cfg(feature = "server")]
use std::sync::Arc;

#[cfg(feature = "server")]
use crate::{
    CacheStore, HttpFetcher, Huginn, Identity, MemoryStore, PlacesTransform, Proxy,
    ResponseTransform, Result,
};

/// Build a [`Proxy`] from daemon configuration.
///
/// Must run inside a tokio runtime when the storage DSN names PostgreSQL,
/// since the store starts its liveness loop immediately.
#[cfg(feature = "server")]
pub fn build_proxy(config: &config::Config) -> Result<Proxy> {
    config.validate()?;

    let transform: Arc<dyn ResponseTransform> = match config.upstream.transform {
        config::TransformKind::Places => Arc::new(PlacesTransform),
        config::TransformKind::Identity => Arc::new(Identity),
    };
    let fetcher = HttpFetcher::with_timeout(&config.upstream.url, config.upstream.timeout())?
        .transform(transform);

    Huginn::builder()
        .store(build_store(&config.storage)?)
        .fetcher(Arc::new(fetcher))
        .upstream_url(&config.upstream.url)
        .dsn(&config.storage.dsn)
        .sla(config.cache.sla())
        .expiry_period(config.cache.expiry_period())
        .deadline_policy(config.cache.deadline_policy)
        .setting("address", &config.server.address)
        .setting("control_address", &config.server.control_address)
        .setting("debug", config.server.debug)
        .build()
}

#[cfg(feature = "server")]
fn build_store(storage: &config::StorageConfig) -> Result<Arc<dyn CacheStore>> {
    if storage.is_memory() {
        return Ok(Arc::new(MemoryStore::new()));
    }

    #[cfg(feature = "postgres")]
    {
        let pg = crate::PostgresConfig::new(&storage.dsn)
            .liveness_interval(storage.liveness_interval());
        let store: Arc<dyn CacheStore> = crate::PostgresStore::connect(&pg)?;
        Ok(store)
    }

    #[cfg(not(feature = "postgres"))]
    {
        Err(crate::HuginnError::Configuration(
            "postgres storage requested but the `postgres` feature is disabled".into(),
        ))
    }
}
