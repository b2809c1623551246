//! Builder for configuring proxy instances

use std::sync::Arc;
use std::time::Duration;

use super::maintenance::{Maintenance, Setting, mask_dsn};
use super::{CoordinatorConfig, DeadlinePolicy, Proxy, RequestCoordinator};
use crate::store::{CacheStore, MemoryStore};
use crate::upstream::UpstreamFetcher;
use crate::{HuginnError, Result};

/// Shortest accepted expiry period.
pub const MIN_EXPIRY_PERIOD: Duration = Duration::from_secs(60);

/// Shortest accepted SLA.
pub const MIN_SLA: Duration = Duration::from_millis(1);

/// Default SLA: 3 seconds.
pub const DEFAULT_SLA: Duration = Duration::from_secs(3);

/// Default expiry period: 24 hours.
pub const DEFAULT_EXPIRY_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// Main entry point for creating proxy instances.
pub struct Huginn;

impl Huginn {
    /// Create a new builder for configuring the proxy.
    pub fn builder() -> HuginnBuilder {
        HuginnBuilder::new()
    }
}

/// Builder for configuring proxy instances.
///
/// The store defaults to a fresh [`MemoryStore`]; a fetcher is required.
pub struct HuginnBuilder {
    store: Option<Arc<dyn CacheStore>>,
    fetcher: Option<Arc<dyn UpstreamFetcher>>,
    upstream_url: Option<String>,
    dsn: Option<String>,
    sla: Duration,
    expiry_period: Duration,
    deadline_policy: DeadlinePolicy,
    extra_settings: Vec<Setting>,
}

impl HuginnBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            fetcher: None,
            upstream_url: None,
            dsn: None,
            sla: DEFAULT_SLA,
            expiry_period: DEFAULT_EXPIRY_PERIOD,
            deadline_policy: DeadlinePolicy::default(),
            extra_settings: Vec::new(),
        }
    }

    /// Use this cache backend.
    pub fn store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use this upstream fetcher.
    pub fn fetcher(mut self, fetcher: Arc<dyn UpstreamFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Upstream address, reported in the settings snapshot.
    pub fn upstream_url(mut self, url: impl Into<String>) -> Self {
        self.upstream_url = Some(url.into());
        self
    }

    /// Storage connection string, reported (masked) in the settings snapshot.
    pub fn dsn(mut self, dsn: impl Into<String>) -> Self {
        self.dsn = Some(dsn.into());
        self
    }

    /// Overall per-request deadline. Must be at least [`MIN_SLA`].
    pub fn sla(mut self, sla: Duration) -> Self {
        self.sla = sla;
        self
    }

    /// Age after which an entry is stale. Must be at least
    /// [`MIN_EXPIRY_PERIOD`].
    pub fn expiry_period(mut self, period: Duration) -> Self {
        self.expiry_period = period;
        self
    }

    pub fn deadline_policy(mut self, policy: DeadlinePolicy) -> Self {
        self.deadline_policy = policy;
        self
    }

    /// Append an extra line to the settings snapshot (listen addresses,
    /// debug flags, ...). Values are exposed verbatim.
    pub fn setting(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.extra_settings.push(Setting::new(name, value));
        self
    }

    /// Build the proxy.
    pub fn build(self) -> Result<Proxy> {
        validate_timing(self.sla, self.expiry_period)?;

        let fetcher = self
            .fetcher
            .ok_or_else(|| HuginnError::Configuration("no upstream fetcher configured".into()))?;
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn CacheStore>);

        let mut settings = Vec::new();
        if let Some(url) = &self.upstream_url {
            settings.push(Setting::new("upstream", url));
        }
        settings.push(Setting::new(
            "expiry_period",
            format!("{:?}", self.expiry_period),
        ));
        settings.push(Setting::new("sla", format!("{:?}", self.sla)));
        settings.push(Setting::new(
            "deadline_policy",
            self.deadline_policy.as_str(),
        ));
        settings.push(Setting::new("storage", store.name()));
        if let Some(dsn) = &self.dsn {
            settings.push(Setting::new("dsn", mask_dsn(dsn)));
        }
        settings.extend(self.extra_settings);

        let config = CoordinatorConfig::new(self.sla, self.expiry_period)
            .deadline_policy(self.deadline_policy);
        let coordinator = RequestCoordinator::new(Arc::clone(&store), Arc::clone(&fetcher), config);
        let maintenance = Maintenance::new(Arc::clone(&store), fetcher, settings);

        Ok(Proxy::new(store, coordinator, maintenance))
    }
}

impl Default for HuginnBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Enforce the minimum SLA and expiry period.
pub fn validate_timing(sla: Duration, expiry_period: Duration) -> Result<()> {
    if expiry_period < MIN_EXPIRY_PERIOD {
        return Err(HuginnError::Configuration(format!(
            "expiry period should be at least {MIN_EXPIRY_PERIOD:?}, got {expiry_period:?}"
        )));
    }
    if sla < MIN_SLA {
        return Err(HuginnError::Configuration(format!(
            "SLA should be at least {MIN_SLA:?}, got {sla:?}"
        )));
    }
    Ok(())
}
