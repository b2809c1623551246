//! Request-race coordinator.
//!
//! Resolves one client request by racing a storage lookup against an
//! upstream fetch under an SLA deadline.
//!
//! # The race
//!
//! Three branches start together:
//!
//! 1. **storage**: `CacheStore::lookup(query)`, polled in place;
//! 2. **upstream**: a spawned task that waits `grace_delay` (`sla / 10`)
//!    and then calls `UpstreamFetcher::fetch(query)`. Cancelling it during
//!    the grace delay means upstream is never called; once the fetch has
//!    started it always runs to completion and publishes its outcome on a
//!    oneshot channel, whether or not anyone still listens;
//! 3. **deadline**: a one-shot timer at `sla`.
//!
//! Each branch is consumed at most once. When several are ready at the
//! same time they are handled in the order storage, upstream, deadline.
//!
//! | event                                  | decision                                          |
//! |----------------------------------------|---------------------------------------------------|
//! | fresh entry                            | serve it, cancel upstream, detach late save       |
//! | stale entry                            | remember as fallback, keep waiting                |
//! | miss / storage unavailable             | keep waiting                                      |
//! | upstream success                       | serve it, detach write-back                       |
//! | upstream failure, fallback present     | serve stale                                       |
//! | upstream failure, no fallback          | return the failure                                |
//! | deadline, fallback present             | serve stale, cancel upstream, detach late save    |
//! | deadline, no fallback                  | per [`DeadlinePolicy`]                            |
//!
//! Popularity accounting and write-back never sit on the response path:
//! they run in detached tasks that log their own failures. The late save
//! waits at most `2 × sla` for an upstream result, so it cannot outlive
//! a hanging upstream indefinitely.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::store::CacheStore;
use crate::telemetry;
use crate::types::{CacheEntry, FetchOutcome, Request, Response, SaveRequest, Source};
use crate::upstream::UpstreamFetcher;
use crate::{HuginnError, Result};

/// What to do when the SLA runs out and no stale entry is available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlinePolicy {
    /// The SLA is final: fail with [`HuginnError::DeadlineExceeded`]. The
    /// in-flight upstream call keeps running and its result is still
    /// written back, so the next request for the key finds it cached.
    #[default]
    Strict,
    /// Keep waiting for the upstream call however long it takes. The SLA
    /// then only decides when a stale entry becomes acceptable.
    AwaitUpstream,
}

impl DeadlinePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeadlinePolicy::Strict => "strict",
            DeadlinePolicy::AwaitUpstream => "await_upstream",
        }
    }
}

/// Timing configuration for [`RequestCoordinator`].
///
/// ```rust
/// # use huginn::{CoordinatorConfig, DeadlinePolicy};
/// # use std::time::Duration;
/// let config = CoordinatorConfig::new(Duration::from_secs(3), Duration::from_secs(3600))
///     .deadline_policy(DeadlinePolicy::AwaitUpstream);
/// assert_eq!(config.grace_delay(), Duration::from_millis(300));
/// ```
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Overall time budget for one request.
    pub sla: Duration,
    /// Age after which an entry is stale.
    pub expiry_period: Duration,
    pub deadline_policy: DeadlinePolicy,
}

impl CoordinatorConfig {
    pub fn new(sla: Duration, expiry_period: Duration) -> Self {
        Self {
            sla,
            expiry_period,
            deadline_policy: DeadlinePolicy::default(),
        }
    }

    pub fn deadline_policy(mut self, policy: DeadlinePolicy) -> Self {
        self.deadline_policy = policy;
        self
    }

    /// Head start given to the storage branch before upstream is called.
    pub fn grace_delay(&self) -> Duration {
        self.sla / 10
    }

    /// Upper bound on waiting for an upstream result nobody is waiting for.
    pub fn late_arrival_bound(&self) -> Duration {
        self.sla * 2
    }
}

/// One branch result, pulled out of the select so handling happens with
/// no branch borrowed.
enum Event {
    Storage(Result<CacheEntry>),
    Upstream(std::result::Result<FetchOutcome, oneshot::error::RecvError>),
    Deadline,
}

/// Resolves client requests from cache or upstream under an SLA.
pub struct RequestCoordinator {
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn UpstreamFetcher>,
    config: CoordinatorConfig,
}

impl RequestCoordinator {
    pub fn new(
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn UpstreamFetcher>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            store,
            fetcher,
            config,
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Resolve one request.
    ///
    /// Returns the served payload, or the upstream failure when upstream
    /// won the race with a failure outcome and no expired entry was found
    /// before it. Storage errors never surface here.
    pub async fn resolve(&self, request: &Request) -> Result<Response> {
        let started = Instant::now();
        let result = self.race(request).await;

        let source = match &result {
            Ok(response) => response.source.as_str(),
            Err(_) => "none",
        };
        metrics::counter!(telemetry::REQUESTS_TOTAL, "source" => source).increment(1);
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS, "source" => source)
            .record(started.elapsed().as_secs_f64());

        result
    }

    async fn race(&self, request: &Request) -> Result<Response> {
        let id = request.id.as_str();
        let sla = self.config.sla;

        let (cancel_tx, cancel_rx) = oneshot::channel();
        let mut cancel = Some(cancel_tx);
        let mut upstream = self.spawn_upstream(request, cancel_rx);

        let lookup = self.store.lookup(&request.query);
        tokio::pin!(lookup);
        let deadline = tokio::time::sleep(sla);
        tokio::pin!(deadline);

        let mut lookup_pending = true;
        let mut deadline_fired = false;
        let mut fallback: Option<CacheEntry> = None;

        loop {
            let event = tokio::select! {
                biased;
                result = &mut lookup, if lookup_pending => Event::Storage(result),
                outcome = &mut upstream => Event::Upstream(outcome),
                () = &mut deadline, if !deadline_fired => Event::Deadline,
            };

            match event {
                Event::Storage(result) => {
                    lookup_pending = false;
                    match result {
                        Ok(entry) if entry.is_fresh(self.config.expiry_period) => {
                            info!(id, "found a fresh cache entry");
                            metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
                            cancel_upstream(cancel.take());
                            self.spawn_late_save(request, upstream);
                            self.spawn_record_access(request);
                            return Ok(Response {
                                payload: entry.payload,
                                status_code: entry.status_code,
                                source: Source::Cache,
                            });
                        }
                        Ok(entry) => {
                            info!(id, refreshed_at = %entry.refreshed_at, "found an expired cache entry");
                            if deadline_fired {
                                // The budget is already spent; an expired answer
                                // now beats waiting any longer.
                                return Ok(self.serve_stale(request, entry, cancel.take(), upstream));
                            }
                            fallback = Some(entry);
                        }
                        Err(e) if e.is_cache_miss() => {
                            debug!(id, reason = %e, "no usable cache entry");
                            metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
                        }
                        Err(e) => {
                            warn!(id, error = %e, "cache lookup failed");
                            metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
                        }
                    }
                }
                Event::Upstream(Ok(outcome)) => {
                    info!(id, status = outcome.status_code, "received a response from upstream");
                    if !outcome.is_success() {
                        if let Some(entry) = fallback.take() {
                            metrics::counter!(telemetry::UPSTREAM_REQUESTS_TOTAL, "status" => "error")
                                .increment(1);
                            warn!(id, "upstream failed, returning an expired cache entry");
                            return Ok(self.stale_response(request, entry));
                        }
                    }
                    return self.serve_upstream(request, outcome);
                }
                Event::Upstream(Err(_)) => {
                    // The branch ended without publishing, which only happens if
                    // the fetcher panicked.
                    error!(id, "upstream branch ended without an outcome");
                    if let Some(entry) = fallback.take() {
                        return Ok(self.serve_stale(request, entry, cancel.take(), upstream));
                    }
                    return Err(HuginnError::UpstreamUnavailable);
                }
                Event::Deadline => {
                    deadline_fired = true;
                    warn!(id, ?sla, "reached SLA");
                    if let Some(entry) = fallback.take() {
                        warn!(id, "returning an expired cache entry");
                        return Ok(self.serve_stale(request, entry, cancel.take(), upstream));
                    }
                    match self.config.deadline_policy {
                        DeadlinePolicy::Strict => {
                            warn!(id, "no cache available, giving up on upstream");
                            self.spawn_late_save(request, upstream);
                            return Err(HuginnError::DeadlineExceeded { sla });
                        }
                        DeadlinePolicy::AwaitUpstream => {
                            warn!(id, "no cache available, still waiting for upstream");
                        }
                    }
                }
            }
        }
    }

    fn serve_stale(
        &self,
        request: &Request,
        entry: CacheEntry,
        cancel: Option<oneshot::Sender<()>>,
        upstream: oneshot::Receiver<FetchOutcome>,
    ) -> Response {
        cancel_upstream(cancel);
        self.spawn_late_save(request, upstream);
        self.stale_response(request, entry)
    }

    fn stale_response(&self, request: &Request, entry: CacheEntry) -> Response {
        metrics::counter!(telemetry::STALE_SERVED_TOTAL).increment(1);
        self.spawn_record_access(request);
        Response {
            payload: entry.payload,
            status_code: entry.status_code,
            source: Source::Stale,
        }
    }

    fn serve_upstream(&self, request: &Request, outcome: FetchOutcome) -> Result<Response> {
        let status = if outcome.is_success() { "ok" } else { "error" };
        metrics::counter!(telemetry::UPSTREAM_REQUESTS_TOTAL, "status" => status).increment(1);

        let FetchOutcome {
            payload,
            status_code,
            failure,
        } = outcome;

        if let Some(error) = failure {
            // Failed attempts are not cached; the access still counts.
            self.spawn_record_access(request);
            return Err(error);
        }

        let store = Arc::clone(&self.store);
        let save = SaveRequest::new(request.query.clone(), payload.clone(), status_code);
        let (id, query) = (request.id.clone(), request.query.clone());
        tokio::spawn(async move {
            if let Err(e) = store.save(save).await {
                warn!(id = %id, error = %e, "failed to save upstream response");
            }
            if let Err(e) = store.record_access(&query).await {
                warn!(id = %id, error = %e, "failed to update access statistics");
            }
        });

        Ok(Response {
            payload,
            status_code,
            source: Source::Upstream,
        })
    }

    /// Start the upstream branch: grace delay, then exactly one fetch.
    fn spawn_upstream(
        &self,
        request: &Request,
        cancel: oneshot::Receiver<()>,
    ) -> oneshot::Receiver<FetchOutcome> {
        let (tx, rx) = oneshot::channel();
        let fetcher = Arc::clone(&self.fetcher);
        let grace = self.config.grace_delay();
        let (id, query) = (request.id.clone(), request.query.clone());

        tokio::spawn(async move {
            tokio::select! {
                biased;
                // An explicit cancel and a dropped coordinator both land here.
                _ = cancel => {
                    debug!(id = %id, "upstream call cancelled during grace delay");
                    return;
                }
                () = tokio::time::sleep(grace) => {}
            }
            debug!(id = %id, query = %query, "start processing request to upstream");
            let outcome = fetcher.fetch(&query).await;
            if tx.send(outcome).is_err() {
                debug!(id = %id, "upstream outcome arrived after everyone stopped waiting");
            }
        });

        rx
    }

    /// Wait (bounded) for an upstream result the client no longer needs and
    /// write it back if the transport succeeded.
    fn spawn_late_save(&self, request: &Request, upstream: oneshot::Receiver<FetchOutcome>) {
        let store = Arc::clone(&self.store);
        let bound = self.config.late_arrival_bound();
        let (id, query) = (request.id.clone(), request.query.clone());

        tokio::spawn(async move {
            match tokio::time::timeout(bound, upstream).await {
                Ok(Ok(outcome)) if outcome.is_success() => {
                    info!(id = %id, "upstream answered after the client was served, refreshing cache");
                    metrics::counter!(telemetry::LATE_SAVES_TOTAL).increment(1);
                    let save = SaveRequest::new(query, outcome.payload, outcome.status_code);
                    if let Err(e) = store.save(save).await {
                        warn!(id = %id, error = %e, "failed to save late upstream response");
                    }
                }
                Ok(Ok(outcome)) => {
                    debug!(id = %id, status = outcome.status_code, "late upstream attempt failed, nothing to save");
                }
                // Cancelled before the fetch started.
                Ok(Err(_)) => {}
                Err(_) => {
                    debug!(id = %id, ?bound, "gave up waiting for a late upstream response");
                }
            }
        });
    }

    fn spawn_record_access(&self, request: &Request) {
        let store = Arc::clone(&self.store);
        let (id, query) = (request.id.clone(), request.query.clone());
        tokio::spawn(async move {
            if let Err(e) = store.record_access(&query).await {
                warn!(id = %id, error = %e, "failed to update access statistics");
            }
        });
    }
}

fn cancel_upstream(cancel: Option<oneshot::Sender<()>>) {
    if let Some(cancel) = cancel {
        // Err only means the branch already finished.
        let _ = cancel.send(());
    }
}
