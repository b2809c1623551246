//! Proxy facade: the coordinator and maintenance surface wired to one store.

mod builder;
pub mod coordinator;
pub mod maintenance;

pub use builder::{
    DEFAULT_EXPIRY_PERIOD, DEFAULT_SLA, Huginn, HuginnBuilder, MIN_EXPIRY_PERIOD, MIN_SLA,
    validate_timing,
};
pub use coordinator::{CoordinatorConfig, DeadlinePolicy, RequestCoordinator};
pub use maintenance::{Maintenance, RefreshReport, Setting};

use std::sync::Arc;

use tracing::info;

use crate::Result;
use crate::store::CacheStore;
use crate::types::{Request, Response};

/// A configured caching proxy.
///
/// Frontends hold one `Proxy` (usually behind an `Arc`) and map client
/// requests onto [`handle`](Self::handle) and admin calls onto
/// [`maintenance`](Self::maintenance).
pub struct Proxy {
    store: Arc<dyn CacheStore>,
    coordinator: RequestCoordinator,
    maintenance: Maintenance,
}

impl Proxy {
    pub(crate) fn new(
        store: Arc<dyn CacheStore>,
        coordinator: RequestCoordinator,
        maintenance: Maintenance,
    ) -> Self {
        Self {
            store,
            coordinator,
            maintenance,
        }
    }

    /// Resolve a client request from cache or upstream.
    pub async fn handle(&self, request: Request) -> Result<Response> {
        info!(id = %request.id, query = %request.query, "new request is received");
        self.coordinator.resolve(&request).await
    }

    pub fn maintenance(&self) -> &Maintenance {
        &self.maintenance
    }

    pub fn coordinator(&self) -> &RequestCoordinator {
        &self.coordinator
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }
}
