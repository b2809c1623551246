//! axum routers for the client and admin listeners.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{info, warn};

use super::convert::{EntryView, ErrorView, HealthStatus, HealthView};
use crate::{HuginnError, Proxy, Request, Result};

/// Default `n` for the top/bottom listings.
const DEFAULT_LISTING_SIZE: usize = 10;

// =============================================================================
// Client listener
// =============================================================================

/// Router serving cached upstream responses on `upstream_url`'s path.
pub fn client_router(proxy: Arc<Proxy>, upstream_url: &str) -> Result<Router> {
    let path = client_path(upstream_url)?;
    info!(%path, "client route configured");
    Ok(Router::new()
        .route(&path, any(client_request))
        .with_state(proxy))
}

/// Path component of the upstream URL.
pub fn client_path(upstream_url: &str) -> Result<String> {
    let url = reqwest::Url::parse(upstream_url)
        .map_err(|e| HuginnError::Configuration(format!("invalid upstream url: {e}")))?;
    Ok(url.path().to_string())
}

/// Cache key for an inbound URI: `?` plus the raw query, or empty.
pub fn cache_key(uri: &Uri) -> String {
    uri.query().map(|q| format!("?{q}")).unwrap_or_default()
}

async fn client_request(State(proxy): State<Arc<Proxy>>, method: Method, uri: Uri) -> Response {
    if method != Method::GET {
        info!(%method, "non-GET request received");
        return (StatusCode::BAD_REQUEST, "400 bad request").into_response();
    }

    match proxy.handle(Request::new(cache_key(&uri))).await {
        Ok(response) => {
            let status =
                StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::BAD_GATEWAY);
            (status, response.payload).into_response()
        }
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("500 Internal Server Error\n{err}"),
        )
            .into_response(),
    }
}

// =============================================================================
// Admin listener
// =============================================================================

/// Router exposing the maintenance operations as JSON.
pub fn admin_router(proxy: Arc<Proxy>) -> Router {
    Router::new()
        .route("/admin/top", get(top))
        .route("/admin/bottom", get(bottom))
        .route("/admin/entries", get(entries))
        .route("/admin/settings", get(settings))
        .route("/admin/clean", post(clean))
        .route("/admin/refresh", post(refresh))
        .route("/admin/health", get(health))
        .with_state(proxy)
}

#[derive(Debug, Deserialize)]
struct ListingParams {
    n: Option<usize>,
}

impl ListingParams {
    fn n(&self) -> usize {
        self.n.unwrap_or(DEFAULT_LISTING_SIZE)
    }
}

fn admin_error(err: HuginnError) -> Response {
    let status = match err {
        HuginnError::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!(error = %err, "admin request failed");
    (
        status,
        Json(ErrorView {
            error: err.to_string(),
        }),
    )
        .into_response()
}

fn entries_response(result: Result<Vec<crate::CacheEntry>>) -> Response {
    match result {
        Ok(entries) => {
            let views: Vec<EntryView> = entries.into_iter().map(EntryView::from).collect();
            Json(views).into_response()
        }
        Err(err) => admin_error(err),
    }
}

async fn top(State(proxy): State<Arc<Proxy>>, Query(params): Query<ListingParams>) -> Response {
    entries_response(proxy.maintenance().top_n(params.n()).await)
}

async fn bottom(State(proxy): State<Arc<Proxy>>, Query(params): Query<ListingParams>) -> Response {
    entries_response(proxy.maintenance().bottom_n(params.n()).await)
}

async fn entries(State(proxy): State<Arc<Proxy>>) -> Response {
    entries_response(proxy.maintenance().all().await)
}

async fn settings(State(proxy): State<Arc<Proxy>>) -> Response {
    Json(proxy.maintenance().settings_snapshot()).into_response()
}

async fn clean(State(proxy): State<Arc<Proxy>>) -> Response {
    match proxy.maintenance().clean().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => admin_error(err),
    }
}

async fn refresh(State(proxy): State<Arc<Proxy>>) -> Response {
    match proxy.maintenance().refresh().await {
        Ok(report) => Json(report).into_response(),
        Err(err) => admin_error(err),
    }
}

async fn health(State(proxy): State<Arc<Proxy>>) -> Response {
    let storage = proxy.store().name().to_string();
    let (status, view) = match proxy.store().ready().await {
        Ok(_) => (
            StatusCode::OK,
            HealthView {
                status: HealthStatus::Healthy,
                version: crate::version_string(),
                storage,
                error: None,
            },
        ),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            HealthView {
                status: HealthStatus::Unhealthy,
                version: crate::version_string(),
                storage,
                error: Some(err.to_string()),
            },
        ),
    };
    (status, Json(view)).into_response()
}
