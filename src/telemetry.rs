//! Telemetry metric name constants.
//!
//! Centralised metric names for huginn operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `huginn_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `source`: where a client response came from: "cache", "upstream", "stale"
//! - `status`: outcome: "ok" or "error"

/// Total client requests resolved by the coordinator.
///
/// Labels: `source` ("cache" | "upstream" | "stale" | "none").
pub const REQUESTS_TOTAL: &str = "huginn_requests_total";

/// Time from request start to the coordinator's decision, in seconds.
///
/// Labels: `source`.
pub const REQUEST_DURATION_SECONDS: &str = "huginn_request_duration_seconds";

/// Storage lookups that produced a fresh entry.
pub const CACHE_HITS_TOTAL: &str = "huginn_cache_hits_total";

/// Storage lookups that produced nothing usable (missing or unavailable).
pub const CACHE_MISSES_TOTAL: &str = "huginn_cache_misses_total";

/// Expired entries served because the SLA ran out.
pub const STALE_SERVED_TOTAL: &str = "huginn_stale_served_total";

/// Upstream outcomes observed by the coordinator or bulk refresh.
///
/// Labels: `status` ("ok" | "error").
pub const UPSTREAM_REQUESTS_TOTAL: &str = "huginn_upstream_requests_total";

/// Upstream results that arrived after the client was answered and were
/// written back to the store.
pub const LATE_SAVES_TOTAL: &str = "huginn_late_saves_total";

/// Keys that bulk refresh failed to re-fetch.
pub const REFRESH_FAILURES_TOTAL: &str = "huginn_refresh_failures_total";
