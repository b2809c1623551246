//! HTTP route tests driven through `tower::ServiceExt::oneshot`.

#![cfg(feature = "server")]

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request as HttpRequest, StatusCode};
use tower::ServiceExt;

use huginn::server::convert::{EntryView, HealthStatus, HealthView};
use huginn::server::{admin_router, client_router};
use huginn::{
    CacheStore, FetchOutcome, Huginn, MemoryStore, Proxy, RefreshReport, SaveRequest, Setting,
    UpstreamFetcher,
};

const UPSTREAM: &str = "http://upstream.test/v2/places.json";

struct EchoFetcher {
    status: u16,
    fail: bool,
}

#[async_trait]
impl UpstreamFetcher for EchoFetcher {
    async fn fetch(&self, query: &str) -> FetchOutcome {
        if self.fail {
            FetchOutcome::unavailable()
        } else {
            FetchOutcome::success(format!("echo {query}"), self.status)
        }
    }
}

fn proxy(store: Arc<MemoryStore>, status: u16, fail: bool) -> Arc<Proxy> {
    Arc::new(
        Huginn::builder()
            .store(store)
            .fetcher(Arc::new(EchoFetcher { status, fail }))
            .upstream_url(UPSTREAM)
            .dsn("postgres://huginn:hunter2@db/huginn")
            .build()
            .unwrap(),
    )
}

async fn call(router: Router, method: &str, uri: &str) -> (StatusCode, Vec<u8>) {
    let request = HttpRequest::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

// ============================================================================
// Client route
// ============================================================================

#[tokio::test]
async fn client_route_serves_upstream_payload() {
    let router = client_router(proxy(Arc::new(MemoryStore::new()), 200, false), UPSTREAM).unwrap();
    let (status, body) = call(router, "GET", "/v2/places.json?term=Mos&locale=en").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"echo ?term=Mos&locale=en");
}

#[tokio::test]
async fn client_route_keeps_upstream_status() {
    let router = client_router(proxy(Arc::new(MemoryStore::new()), 404, false), UPSTREAM).unwrap();
    let (status, body) = call(router, "GET", "/v2/places.json?term=zz").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, b"echo ?term=zz");
}

#[tokio::test]
async fn client_route_reports_failures_as_500() {
    let router = client_router(proxy(Arc::new(MemoryStore::new()), 200, true), UPSTREAM).unwrap();
    let (status, body) = call(router, "GET", "/v2/places.json?term=Mos").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        String::from_utf8(body).unwrap(),
        "500 Internal Server Error\nendpoint API is unavailable"
    );
}

#[tokio::test]
async fn client_route_rejects_non_get() {
    let router = client_router(proxy(Arc::new(MemoryStore::new()), 200, false), UPSTREAM).unwrap();
    let (status, body) = call(router, "POST", "/v2/places.json?term=Mos").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, b"400 bad request");
}

#[tokio::test]
async fn client_route_only_serves_upstream_path() {
    let router = client_router(proxy(Arc::new(MemoryStore::new()), 200, false), UPSTREAM).unwrap();
    let (status, _) = call(router, "GET", "/elsewhere?term=Mos").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Admin routes
// ============================================================================

async fn seeded() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    for (key, accesses) in [("?a", 2), ("?b", 1)] {
        store
            .save(SaveRequest::new(key, format!("payload {key}"), 200))
            .await
            .unwrap();
        for _ in 0..accesses {
            store.record_access(key).await.unwrap();
        }
    }
    store
}

#[tokio::test]
async fn admin_top_and_bottom_render_entries() {
    let router = admin_router(proxy(seeded().await, 200, false));

    let (status, body) = call(router.clone(), "GET", "/admin/top?n=1").await;
    assert_eq!(status, StatusCode::OK);
    let top: Vec<EntryView> = serde_json::from_slice(&body).unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].key, "?a");
    assert_eq!(top[0].payload, "payload ?a");
    assert_eq!(top[0].access_count, 2);

    let (_, body) = call(router.clone(), "GET", "/admin/bottom?n=1").await;
    let bottom: Vec<EntryView> = serde_json::from_slice(&body).unwrap();
    assert_eq!(bottom[0].key, "?b");

    let (_, body) = call(router, "GET", "/admin/entries").await;
    let all: Vec<EntryView> = serde_json::from_slice(&body).unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn admin_settings_are_masked() {
    let router = admin_router(proxy(Arc::new(MemoryStore::new()), 200, false));
    let (status, body) = call(router, "GET", "/admin/settings").await;
    assert_eq!(status, StatusCode::OK);

    let settings: Vec<Setting> = serde_json::from_slice(&body).unwrap();
    assert!(settings.contains(&Setting::new("dsn", "postgres://huginn:**********@db/huginn")));
    assert!(!String::from_utf8(body).unwrap().contains("hunter2"));
}

#[tokio::test]
async fn admin_clean_and_refresh() {
    let store = seeded().await;
    let router = admin_router(proxy(Arc::clone(&store), 200, false));

    let (status, body) = call(router.clone(), "POST", "/admin/refresh").await;
    assert_eq!(status, StatusCode::OK);
    let report: RefreshReport = serde_json::from_slice(&body).unwrap();
    assert_eq!(report.refreshed, 2);
    assert_eq!(store.lookup("?a").await.unwrap().payload, b"echo ?a");

    let (status, _) = call(router.clone(), "POST", "/admin/clean").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(store.all().await.unwrap().is_empty());

    let (status, _) = call(router, "GET", "/admin/clean").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn admin_health_reports_storage() {
    let router = admin_router(proxy(Arc::new(MemoryStore::new()), 200, false));
    let (status, body) = call(router, "GET", "/admin/health").await;
    assert_eq!(status, StatusCode::OK);

    let health: HealthView = serde_json::from_slice(&body).unwrap();
    assert_eq!(health.status, HealthStatus::Healthy);
    assert_eq!(health.storage, "memory");
    assert_eq!(health.version, huginn::version_string());
}

// ============================================================================
// Unavailable storage
// ============================================================================

/// Store that never becomes ready.
struct DownStore;

#[async_trait]
impl CacheStore for DownStore {
    fn name(&self) -> &str {
        "down"
    }

    async fn lookup(&self, _key: &str) -> huginn::Result<huginn::CacheEntry> {
        Err(huginn::HuginnError::StorageUnavailable)
    }

    async fn save(&self, _request: SaveRequest) -> huginn::Result<()> {
        Err(huginn::HuginnError::StorageUnavailable)
    }

    async fn record_access(&self, _key: &str) -> huginn::Result<()> {
        Err(huginn::HuginnError::StorageUnavailable)
    }

    async fn top_n(&self, _n: usize) -> huginn::Result<Vec<huginn::CacheEntry>> {
        Err(huginn::HuginnError::StorageUnavailable)
    }

    async fn bottom_n(&self, _n: usize) -> huginn::Result<Vec<huginn::CacheEntry>> {
        Err(huginn::HuginnError::StorageUnavailable)
    }

    async fn all(&self) -> huginn::Result<Vec<huginn::CacheEntry>> {
        Err(huginn::HuginnError::StorageUnavailable)
    }

    async fn clear(&self) -> huginn::Result<()> {
        Err(huginn::HuginnError::StorageUnavailable)
    }

    async fn ready(&self) -> huginn::Result<()> {
        Err(huginn::HuginnError::StorageUnavailable)
    }
}

fn down_proxy() -> Arc<Proxy> {
    Arc::new(
        Huginn::builder()
            .store(Arc::new(DownStore))
            .fetcher(Arc::new(EchoFetcher {
                status: 200,
                fail: false,
            }))
            .build()
            .unwrap(),
    )
}

#[tokio::test]
async fn admin_reports_unavailable_storage_as_503() {
    let router = admin_router(down_proxy());

    let (status, body) = call(router.clone(), "GET", "/admin/top?n=3").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let error: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(error["error"], "storage subsystem is unavailable");

    let (status, body) = call(router, "GET", "/admin/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let health: HealthView = serde_json::from_slice(&body).unwrap();
    assert_eq!(health.status, HealthStatus::Unhealthy);
}

#[tokio::test]
async fn client_route_works_without_storage() {
    let router = client_router(down_proxy(), UPSTREAM).unwrap();
    let (status, body) = call(router, "GET", "/v2/places.json?term=Mos").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"echo ?term=Mos");
}
