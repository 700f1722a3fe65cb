//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Health check
//! GET  /health/ready                    - Readiness check (database)
//!
//! # Webhooks (HMAC-verified)
//! POST /webhooks/customers/data_request - Customer data export request
//! POST /webhooks/customers/redact       - Customer erasure request
//! POST /webhooks/shop/redact            - Shop erasure request
//! POST /webhooks/app/uninstalled        - App uninstalled
//! POST /webhooks/app/scopes_update      - Access scopes changed
//!
//! # Connector API
//! GET  /api/connector/{shop}            - Fetch connector configuration
//! PUT  /api/connector/{shop}            - Create or update connector configuration
//! POST /api/connector/{shop}/sync       - Push aggregated metrics to the ads platform
//! ```

pub mod connector;
pub mod webhooks;

use axum::Router;

use crate::state::AppState;

/// Create all application routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Webhook intake
        .nest("/webhooks", webhooks::router())
        // Connector API
        .nest("/api/connector", connector::router())
}
