//! Integration tests for Adstem.
//!
//! These tests drive the real axum router in-process (no server, no
//! database) over the in-memory stores, so the full webhook pipeline runs:
//! raw body capture, HMAC verification, payload parsing, compliance
//! handlers, store mutation.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p adstem-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `webhook_security` - HMAC gate behavior and error responses
//! - `compliance_flow` - End-to-end privacy webhook flows
//! - `connector_api` - Merchant-facing connector endpoints
//! - `webhook_config` - Registry and configuration validation

// Test support: helpers panic on malformed fixtures rather than returning errors.
#![allow(clippy::missing_panics_doc)]

use std::net::IpAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use secrecy::SecretString;

use adstem_app::config::AppConfig;
use adstem_app::db::{
    ConnectorConfig, ConnectorStore, MemoryConnectorStore, MemorySessionStore, SessionRecord,
    SessionStore,
};
use adstem_app::routes;
use adstem_app::state::AppState;
use adstem_app::webhooks::{
    SHOP_DOMAIN_HEADER, SHOPIFY_HMAC_HEADER, TOPIC_HEADER, compute_signature,
};
use adstem_core::ShopDomain;

/// Webhook secret used by every test context.
pub const TEST_WEBHOOK_SECRET: &str = "kJ8#mQ2$vN5^xR9!wL3&pT7*zB4@dF6%";

/// Shared context for in-process integration tests.
///
/// Holds the assembled router plus handles to the backing stores so tests
/// can seed data and assert on post-request state.
pub struct TestContext {
    pub app: Router,
    pub sessions: Arc<MemorySessionStore>,
    pub connectors: Arc<MemoryConnectorStore>,
}

impl TestContext {
    /// Build a context over empty in-memory stores.
    #[must_use]
    pub fn new() -> Self {
        let sessions = Arc::new(MemorySessionStore::new());
        let connectors = Arc::new(MemoryConnectorStore::new());

        let state = AppState::with_stores(test_config(), sessions.clone(), connectors.clone())
            .expect("failed to assemble test state");
        let app = routes::routes().with_state(state);

        Self {
            app,
            sessions,
            connectors,
        }
    }

    /// Send a request through the router.
    pub async fn send(&self, request: Request<Body>) -> Response {
        use tower::ServiceExt;

        self.app
            .clone()
            .oneshot(request)
            .await
            .expect("router never fails")
    }

    /// Seed the session store.
    pub async fn seed_sessions(&self, sessions: &[SessionRecord]) {
        for session in sessions {
            self.sessions
                .upsert(session)
                .await
                .expect("memory store never fails");
        }
    }

    /// Sessions currently stored for a shop, ordered by id.
    pub async fn sessions_for(&self, shop_domain: &str) -> Vec<SessionRecord> {
        self.sessions
            .sessions_for_shop(&shop(shop_domain))
            .await
            .expect("memory store never fails")
    }

    /// Seed a connector configuration.
    pub async fn seed_connector(
        &self,
        shop_domain: &str,
        connector_id: Option<&str>,
        is_active: bool,
    ) {
        self.connectors
            .upsert(&shop(shop_domain), connector_id, is_active)
            .await
            .expect("memory store never fails");
    }

    /// Connector configuration currently stored for a shop.
    pub async fn connector_for(&self, shop_domain: &str) -> Option<ConnectorConfig> {
        self.connectors
            .get(&shop(shop_domain))
            .await
            .expect("memory store never fails")
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// App configuration for tests. No database, no sync, no Sentry.
#[must_use]
pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: SecretString::from("postgres://localhost/adstem_test"),
        host: "127.0.0.1".parse::<IpAddr>().expect("valid address"),
        port: 3002,
        base_url: "http://localhost:3002".to_string(),
        webhook_secret: SecretString::from(TEST_WEBHOOK_SECRET),
        sync: None,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 1.0,
    }
}

/// Parse a shop domain, panicking on bad test input.
#[must_use]
pub fn shop(domain: &str) -> ShopDomain {
    ShopDomain::parse(domain).expect("valid test shop domain")
}

/// An offline (shop-level) session record.
#[must_use]
pub fn offline_session(id: &str, shop_domain: &str) -> SessionRecord {
    SessionRecord {
        id: id.to_string(),
        shop: shop(shop_domain),
        state: "offline_state".to_string(),
        is_online: false,
        scope: Some("read_orders,write_products".to_string()),
        expires: None,
        access_token: Some(SecretString::from("shpat_offline_token")),
        user_id: None,
    }
}

/// An online (per-user) session record, the kind customer redaction targets.
#[must_use]
pub fn online_session(id: &str, shop_domain: &str, user_id: i64) -> SessionRecord {
    SessionRecord {
        id: id.to_string(),
        shop: shop(shop_domain),
        state: "online_state".to_string(),
        is_online: true,
        scope: Some("read_orders,write_products".to_string()),
        expires: Some(chrono::Utc::now() + chrono::Duration::hours(24)),
        access_token: Some(SecretString::from("shpat_online_token")),
        user_id: Some(user_id),
    }
}

/// Build a webhook POST signed with [`TEST_WEBHOOK_SECRET`].
///
/// Sets the topic and shop-domain headers the way Shopify does.
#[must_use]
pub fn signed_webhook(path: &str, topic: &str, shop_domain: &str, body: &str) -> Request<Body> {
    let signature = compute_signature(TEST_WEBHOOK_SECRET, body.as_bytes())
        .expect("signature computation succeeds");

    Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .header(SHOPIFY_HMAC_HEADER, signature)
        .header(TOPIC_HEADER, topic)
        .header(SHOP_DOMAIN_HEADER, shop_domain)
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

/// Build a webhook POST with an arbitrary signature header value.
#[must_use]
pub fn webhook_with_signature(
    path: &str,
    topic: &str,
    shop_domain: &str,
    signature: &str,
    body: &str,
) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .header(SHOPIFY_HMAC_HEADER, signature)
        .header(TOPIC_HEADER, topic)
        .header(SHOP_DOMAIN_HEADER, shop_domain)
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

/// Read a response body to a string.
pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    String::from_utf8(bytes.to_vec()).expect("body is UTF-8")
}

/// Read a response body as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("body is JSON")
}
