//! Tests for metrics emitted on the request path and by maintenance.
//!
//! Uses `metrics_util::debugging::DebuggingRecorder` to capture and assert
//! on emitted metrics without needing a real exporter. Only metrics emitted
//! on the calling task are captured; detached tasks run outside the local
//! recorder.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use metrics_util::MetricKind;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};

use huginn::{
    CacheStore, FetchOutcome, Huginn, MemoryStore, Proxy, Request, SaveRequest, UpstreamFetcher,
    telemetry,
};

// ============================================================================
// Test doubles
// ============================================================================

struct StaticFetcher {
    ok: bool,
}

#[async_trait]
impl UpstreamFetcher for StaticFetcher {
    async fn fetch(&self, _query: &str) -> FetchOutcome {
        if self.ok {
            FetchOutcome::success(&b"upstream"[..], 200)
        } else {
            FetchOutcome::unavailable()
        }
    }
}

fn proxy(store: Arc<MemoryStore>, ok: bool) -> Proxy {
    Huginn::builder()
        .store(store)
        .fetcher(Arc::new(StaticFetcher { ok }))
        .build()
        .unwrap()
}

// ============================================================================
// Snapshot helpers
// ============================================================================

type SnapshotVec = Vec<(
    metrics_util::CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
)>;

/// Sum all counter values matching a given metric name.
fn counter_total(snapshot: &SnapshotVec, name: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| key.kind() == MetricKind::Counter && key.key().name() == name)
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

/// Counter value for a metric carrying `label = value`.
fn labelled_counter(snapshot: &SnapshotVec, name: &str, label: &str, value: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| {
            key.kind() == MetricKind::Counter
                && key.key().name() == name
                && key
                    .key()
                    .labels()
                    .any(|l| l.key() == label && l.value() == value)
        })
        .map(|(_, _, _, v)| match v {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

fn has_histogram(snapshot: &SnapshotVec, name: &str) -> bool {
    snapshot
        .iter()
        .any(|(key, _, _, _)| key.kind() == MetricKind::Histogram && key.key().name() == name)
}

/// Runs async code within a local recorder scope on the multi-thread runtime.
///
/// `block_in_place` ensures the sync `with_local_recorder` closure stays
/// on the current thread while `block_on` drives the inner async work.
fn recorded<F: Future>(fut: F) -> (F::Output, SnapshotVec) {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    let output = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(fut))
    });
    (output, snapshotter.snapshot().into_vec())
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn miss_records_miss_and_upstream_metrics() {
    let proxy = proxy(Arc::new(MemoryStore::new()), true);

    let (result, snapshot) = recorded(proxy.handle(Request::new("?q")));
    assert!(result.is_ok());

    assert_eq!(counter_total(&snapshot, telemetry::CACHE_MISSES_TOTAL), 1);
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_HITS_TOTAL), 0);
    assert_eq!(
        labelled_counter(&snapshot, telemetry::UPSTREAM_REQUESTS_TOTAL, "status", "ok"),
        1
    );
    assert_eq!(
        labelled_counter(&snapshot, telemetry::REQUESTS_TOTAL, "source", "upstream"),
        1
    );
    assert!(has_histogram(
        &snapshot,
        telemetry::REQUEST_DURATION_SECONDS
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn fresh_hit_records_hit() {
    let store = Arc::new(MemoryStore::new());
    store
        .save(SaveRequest::new("?q", &b"cached"[..], 200))
        .await
        .unwrap();
    let proxy = proxy(store, true);

    let (result, snapshot) = recorded(proxy.handle(Request::new("?q")));
    assert!(result.is_ok());

    assert_eq!(counter_total(&snapshot, telemetry::CACHE_HITS_TOTAL), 1);
    assert_eq!(
        labelled_counter(&snapshot, telemetry::REQUESTS_TOTAL, "source", "cache"),
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn failed_request_records_error_metrics() {
    let proxy = proxy(Arc::new(MemoryStore::new()), false);

    let (result, snapshot) = recorded(proxy.handle(Request::new("?q")));
    assert!(result.is_err());

    assert_eq!(
        labelled_counter(&snapshot, telemetry::UPSTREAM_REQUESTS_TOTAL, "status", "error"),
        1
    );
    assert_eq!(
        labelled_counter(&snapshot, telemetry::REQUESTS_TOTAL, "source", "none"),
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn refresh_failure_is_counted() {
    let store = Arc::new(MemoryStore::new());
    store
        .save(SaveRequest::new("?q", &b"cached"[..], 200))
        .await
        .unwrap();
    let proxy = proxy(store, false);

    let (report, snapshot) = recorded(proxy.maintenance().refresh());
    assert_eq!(report.unwrap().failed.len(), 1);
    assert_eq!(counter_total(&snapshot, telemetry::REFRESH_FAILURES_TOTAL), 1);
}

#[tokio::test]
async fn metrics_are_noop_without_recorder() {
    // Verify no panics when no recorder is installed.
    let proxy = proxy(Arc::new(MemoryStore::new()), true);
    proxy.handle(Request::new("?q")).await.unwrap();
}
