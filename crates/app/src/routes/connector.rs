//! Merchant-facing connector configuration API.
//!
//! The embedded admin UI reads and writes the shop's connector link here,
//! and triggers metric pushes to the ads platform. Sync is best-effort: a
//! failed push is reported as `synced: false`, never as a request failure.

use adstem_core::ShopDomain;
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::db::ConnectorConfig;
use crate::error::AppError;
use crate::services::SyncReport;
use crate::state::AppState;

/// Create connector API routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{shop}", get(show).put(update))
        .route("/{shop}/sync", post(sync))
}

/// Body of a connector update.
#[derive(Debug, Deserialize)]
struct ConnectorUpdate {
    connector_id: Option<String>,
    #[serde(default = "default_active")]
    is_active: bool,
}

const fn default_active() -> bool {
    true
}

/// Result of a sync trigger.
#[derive(Debug, Serialize)]
struct SyncResponse {
    synced: bool,
}

/// Fetch a shop's connector configuration.
#[instrument(skip(state))]
async fn show(
    State(state): State<AppState>,
    Path(shop): Path<String>,
) -> Result<Json<ConnectorConfig>, AppError> {
    let shop = parse_shop(&shop)?;

    let config = state
        .connectors()
        .get(&shop)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no connector configured for {shop}")))?;

    Ok(Json(config))
}

/// Create or update a shop's connector configuration.
#[instrument(skip(state, update))]
async fn update(
    State(state): State<AppState>,
    Path(shop): Path<String>,
    Json(update): Json<ConnectorUpdate>,
) -> Result<Json<ConnectorConfig>, AppError> {
    let shop = parse_shop(&shop)?;

    let config = state
        .connectors()
        .upsert(&shop, update.connector_id.as_deref(), update.is_active)
        .await?;

    info!(
        shop = %config.shop,
        connector_id = ?config.connector_id,
        is_active = config.is_active,
        "Connector configuration updated"
    );

    Ok(Json(config))
}

/// Push the shop's aggregated metrics to the ads platform.
///
/// Requires an active connector with a linked connector id. The push itself
/// is best-effort: failures are logged and reported as `synced: false`, and
/// never retried here.
#[instrument(skip(state))]
async fn sync(
    State(state): State<AppState>,
    Path(shop): Path<String>,
) -> Result<Json<SyncResponse>, AppError> {
    let shop = parse_shop(&shop)?;

    let config = state
        .connectors()
        .get(&shop)
        .await?
        .filter(|c| c.is_active)
        .ok_or_else(|| AppError::NotFound(format!("no active connector for {shop}")))?;

    let connector_id = config
        .connector_id
        .ok_or_else(|| AppError::NotFound(format!("no connector linked for {shop}")))?;

    let sessions = state.sessions().sessions_for_shop(&shop).await?;
    let online = sessions.iter().filter(|s| s.is_online).count();

    let report = SyncReport {
        shop: shop.clone(),
        connector_id,
        metrics: serde_json::json!({
            "sessions": sessions.len(),
            "online_sessions": online,
        }),
        generated_at: Utc::now(),
    };

    let synced = match state.sync() {
        Some(client) => match client.push_report(&report).await {
            Ok(()) => true,
            Err(e) => {
                warn!(shop = %shop, error = %e, "Metric push failed");
                false
            }
        },
        None => {
            debug!(shop = %shop, "Sync not configured; skipping push");
            false
        }
    };

    Ok(Json(SyncResponse { synced }))
}

fn parse_shop(shop: &str) -> Result<ShopDomain, AppError> {
    ShopDomain::parse(shop).map_err(|e| AppError::BadRequest(format!("invalid shop domain: {e}")))
}
