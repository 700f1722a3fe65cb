//! Integration tests for the merchant-facing connector API.

use axum::body::Body;
use axum::http::{Request, StatusCode};

use adstem_integration_tests::{TestContext, body_json, body_string, offline_session, online_session};

const SHOP: &str = "example.myshopify.com";

fn get(path: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(path)
        .body(Body::empty())
        .expect("valid request")
}

fn put_json(path: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

fn post(path: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .body(Body::empty())
        .expect("valid request")
}

// =============================================================================
// Configuration CRUD
// =============================================================================

#[tokio::test]
async fn test_get_unknown_shop_returns_not_found() {
    let ctx = TestContext::new();

    let response = ctx.send(get("/api/connector/example.myshopify.com")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_put_then_get_round_trips() {
    let ctx = TestContext::new();

    let put_response = ctx
        .send(put_json(
            "/api/connector/example.myshopify.com",
            r#"{"connector_id": "conn-123"}"#,
        ))
        .await;
    assert_eq!(put_response.status(), StatusCode::OK);

    let response = ctx.send(get("/api/connector/example.myshopify.com")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let config = body_json(response).await;
    assert_eq!(config["shop"], "example.myshopify.com");
    assert_eq!(config["connector_id"], "conn-123");
    // is_active defaults to true when the update omits it.
    assert_eq!(config["is_active"], true);
}

#[tokio::test]
async fn test_put_can_deactivate() {
    let ctx = TestContext::new();
    ctx.seed_connector(SHOP, Some("conn-123"), true).await;

    let response = ctx
        .send(put_json(
            "/api/connector/example.myshopify.com",
            r#"{"connector_id": "conn-123", "is_active": false}"#,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let config = ctx.connector_for(SHOP).await.expect("config present");
    assert!(!config.is_active);
}

#[tokio::test]
async fn test_invalid_shop_domain_rejected() {
    let ctx = TestContext::new();

    let response = ctx.send(get("/api/connector/bad_shop.myshopify.com")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let text = body_string(response).await;
    assert!(
        text.contains("invalid shop domain"),
        "unexpected body: {text}"
    );
}

// =============================================================================
// Sync Trigger
// =============================================================================

#[tokio::test]
async fn test_sync_without_connector_returns_not_found() {
    let ctx = TestContext::new();

    let response = ctx
        .send(post("/api/connector/example.myshopify.com/sync"))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sync_with_inactive_connector_returns_not_found() {
    let ctx = TestContext::new();
    ctx.seed_connector(SHOP, Some("conn-123"), false).await;

    let response = ctx
        .send(post("/api/connector/example.myshopify.com/sync"))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sync_with_unlinked_connector_returns_not_found() {
    let ctx = TestContext::new();
    ctx.seed_connector(SHOP, None, true).await;

    let response = ctx
        .send(post("/api/connector/example.myshopify.com/sync"))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sync_reports_false_when_syncing_not_configured() {
    let ctx = TestContext::new();
    ctx.seed_connector(SHOP, Some("conn-123"), true).await;
    ctx.seed_sessions(&[
        offline_session("sess-1", SHOP),
        online_session("sess-2", SHOP, 191_167),
    ])
    .await;

    // Test config has no ads platform credentials, so the push is skipped
    // and reported as such. The endpoint still succeeds.
    let response = ctx
        .send(post("/api/connector/example.myshopify.com/sync"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["synced"], false);
}
