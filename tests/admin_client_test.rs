//! [`AdminClient`] against a wiremock admin listener.

#![cfg(feature = "client")]

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use huginn::HuginnError;
use huginn::client::AdminClient;

#[tokio::test]
async fn top_parses_entries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/top"))
        .and(query_param("n", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "key": "?term=Mos",
                "payload": "[]",
                "status_code": 200,
                "refreshed_at": "2026-01-02T03:04:05Z",
                "last_accessed_at": null,
                "access_count": 7
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = AdminClient::new(format!("{}/", server.uri()));
    let top = client.top(2).await.unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].key, "?term=Mos");
    assert_eq!(top[0].access_count, 7);
    assert!(top[0].last_accessed_at.is_none());
}

#[tokio::test]
async fn clean_posts_and_accepts_no_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/clean"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    AdminClient::new(server.uri()).clean().await.unwrap();
}

#[tokio::test]
async fn error_body_becomes_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/refresh"))
        .respond_with(
            ResponseTemplate::new(503)
                .set_body_json(serde_json::json!({"error": "storage subsystem is unavailable"})),
        )
        .mount(&server)
        .await;

    let err = AdminClient::new(server.uri()).refresh().await.unwrap_err();
    match err {
        HuginnError::Api { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "storage subsystem is unavailable");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unhealthy_daemon_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/health"))
        .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
            "status": "unhealthy",
            "version": "0.1.0",
            "storage": "postgres",
            "error": "storage subsystem is unavailable"
        })))
        .mount(&server)
        .await;

    let health = AdminClient::new(server.uri()).health().await.unwrap();
    assert_eq!(health.storage, "postgres");
    assert!(health.error.is_some());
}

#[tokio::test]
async fn unreachable_daemon_is_http_error() {
    let err = AdminClient::new("http://127.0.0.1:1").settings().await.unwrap_err();
    assert!(matches!(err, HuginnError::Http(_)));
}
