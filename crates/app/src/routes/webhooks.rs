//! Compliance webhook intake.
//!
//! Every route here follows the same pipeline: capture the raw body, verify
//! the HMAC signature, parse, dispatch through the registry table. Any
//! rejection at intake (missing or bad signature, unparseable JSON, missing
//! identity header) produces the same 401; the specific cause is only
//! logged server-side.

use adstem_core::{ShopDomain, WebhookTopic};
use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::error::AppError;
use crate::state::AppState;
use crate::webhooks::{HandlerKind, ScopeUpdatePayload, WebhookMeta, WebhookPayload};

/// Uniform rejection message for unauthenticated or malformed deliveries.
const REJECTED: &str = "webhook rejected";

/// Create webhook intake routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/customers/data_request", post(customer_data_request))
        .route("/customers/redact", post(customer_redact))
        .route("/shop/redact", post(shop_redact))
        .route("/app/uninstalled", post(app_uninstalled))
        .route("/app/scopes_update", post(scopes_update))
}

#[instrument(skip(state, headers, body))]
async fn customer_data_request(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    dispatch(&state, WebhookTopic::CustomersDataRequest, &headers, &body).await
}

#[instrument(skip(state, headers, body))]
async fn customer_redact(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    dispatch(&state, WebhookTopic::CustomersRedact, &headers, &body).await
}

#[instrument(skip(state, headers, body))]
async fn shop_redact(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    dispatch(&state, WebhookTopic::ShopRedact, &headers, &body).await
}

#[instrument(skip(state, headers, body))]
async fn app_uninstalled(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    dispatch(&state, WebhookTopic::AppUninstalled, &headers, &body).await
}

#[instrument(skip(state, headers, body))]
async fn scopes_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    dispatch(&state, WebhookTopic::AppScopesUpdate, &headers, &body).await
}

/// Run one delivery through the verification and dispatch pipeline.
///
/// Verification happens first, over the exact raw bytes, before the body is
/// parsed or anything else looks at the request. The registry decides which
/// compliance operation runs; the response body stays empty on success
/// (Shopify ignores it, and the data export must not be echoed back).
async fn dispatch(
    state: &AppState,
    topic: WebhookTopic,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<StatusCode, AppError> {
    state.verifier().verify(headers, body).map_err(|e| {
        warn!(topic = %topic, error = %e, "Webhook delivery rejected");
        AppError::Unauthorized(REJECTED.into())
    })?;

    let meta = WebhookMeta::from_headers(headers);
    debug!(topic = %topic, webhook_id = ?meta.webhook_id, "Webhook delivery verified");

    let entry = state.registry().lookup(topic).ok_or_else(|| {
        AppError::Internal(format!("no handler registered for topic {topic}"))
    })?;

    match entry.handler {
        HandlerKind::CustomerDataRequest => {
            let payload: WebhookPayload = parse_body(body)?;
            // The export goes to the merchant out of band; only its size is
            // logged here.
            state.compliance().customer_data_request(&payload).await?;
        }
        HandlerKind::CustomerRedact => {
            let payload: WebhookPayload = parse_body(body)?;
            state.compliance().customer_redact(&payload).await?;
        }
        HandlerKind::ShopRedact => {
            let payload: WebhookPayload = parse_body(body)?;
            state.compliance().shop_redact(&payload).await?;
        }
        HandlerKind::Uninstall => {
            // The body is the full shop resource; the shop identity comes
            // from the delivery headers instead.
            let _body: serde_json::Value = parse_body(body)?;
            let shop = shop_from_meta(&meta)?;
            state.compliance().app_uninstalled(&shop).await?;
        }
        HandlerKind::ScopesUpdate => {
            let payload: ScopeUpdatePayload = parse_body(body)?;
            let shop = shop_from_meta(&meta)?;
            state.compliance().scopes_update(&shop, &payload).await?;
        }
    }

    Ok(StatusCode::OK)
}

/// Parse a verified body, mapping parse failures to the uniform 401.
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| {
        warn!(error = %e, "Webhook body rejected after verification");
        AppError::Unauthorized(REJECTED.into())
    })
}

/// Shop identity from the delivery headers, for topics whose body does not
/// carry a `shop_domain` field.
fn shop_from_meta(meta: &WebhookMeta) -> Result<ShopDomain, AppError> {
    meta.shop_domain.clone().ok_or_else(|| {
        warn!("Webhook delivery missing shop domain header");
        AppError::Unauthorized(REJECTED.into())
    })
}
