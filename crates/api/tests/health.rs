//! Integration tests for the health check endpoint and general HTTP behaviour.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{body_json, build_test_app, build_test_app_with, get, FakeTools};
use tower::ServiceExt;

#[tokio::test]
async fn health_check_returns_ok_with_json() {
    let t = build_test_app(FakeTools::default()).await;
    let response = get(t.app.clone(), "/health").await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["ffmpeg_available"], true);
}

#[tokio::test]
async fn health_check_degraded_without_ffmpeg() {
    let t = build_test_app(FakeTools {
        missing: true,
        ..Default::default()
    })
    .await;
    let json = body_json(get(t.app.clone(), "/health").await).await;

    assert_eq!(json["status"], "degraded");
    assert_eq!(json["ffmpeg_available"], false);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let t = build_test_app(FakeTools::default()).await;
    let response = get(t.app.clone(), "/this-route-does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn response_contains_x_request_id_header() {
    let t = build_test_app(FakeTools::default()).await;
    let response = get(t.app.clone(), "/health").await;

    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("Response must contain an x-request-id header");

    // MakeRequestUuid produces a hyphenated UUID.
    assert_eq!(request_id.to_str().unwrap().len(), 36);
}

#[tokio::test]
async fn cors_preflight_returns_correct_headers() {
    let t = build_test_app(FakeTools::default()).await;

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/videos")
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type")
        .body(Body::empty())
        .unwrap();

    let response = t.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(
        headers.get("access-control-allow-origin").unwrap(),
        "http://localhost:5173"
    );
    let allow_methods = headers
        .get("access-control-allow-methods")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(
        allow_methods.contains("POST"),
        "Allow-Methods should contain POST, got: {allow_methods}"
    );
}

#[tokio::test]
async fn cors_wildcard_preflight_allows_any_origin() {
    let t = build_test_app_with(FakeTools::default(), |config| {
        config.cors_origins = vec!["*".to_string()];
    })
    .await;

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/videos")
        .header("Origin", "http://example.com")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type")
        .body(Body::empty())
        .unwrap();

    let response = t.app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
    assert!(headers.get("access-control-allow-credentials").is_none());
}
