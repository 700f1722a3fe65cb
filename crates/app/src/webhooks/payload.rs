//! Webhook payload and delivery-metadata types.
//!
//! Payloads are parsed once per request, after signature verification, and
//! are immutable from then on. Shopify includes fields these types do not
//! model (order id lists, shop billing data); unknown fields are ignored.

use adstem_core::{CustomerId, DataRequestId, ShopDomain, ShopId, WebhookTopic};
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

/// Webhook topic header on every delivery.
pub const TOPIC_HEADER: &str = "x-shopify-topic";

/// Shop domain header on every delivery.
pub const SHOP_DOMAIN_HEADER: &str = "x-shopify-shop-domain";

/// Unique delivery id header, stable across redeliveries.
pub const WEBHOOK_ID_HEADER: &str = "x-shopify-webhook-id";

/// API version header the delivery was serialized with.
pub const API_VERSION_HEADER: &str = "x-shopify-api-version";

/// Body of a compliance webhook delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    /// Shop the delivery concerns.
    pub shop_domain: ShopDomain,
    /// Numeric id of the shop.
    pub shop_id: ShopId,
    /// Data subject, present on `customers/data_request` and
    /// `customers/redact`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerRef>,
    /// Identifies the merchant-initiated request on
    /// `customers/data_request`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_request: Option<DataRequestRef>,
}

/// The customer a compliance request concerns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRef {
    pub id: CustomerId,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Reference to the data request that triggered a
/// `customers/data_request` delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataRequestRef {
    pub id: DataRequestId,
}

/// Body of an `app/scopes_update` delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct ScopeUpdatePayload {
    /// Scopes granted after the update.
    pub current: Vec<String>,
    /// Scopes granted before the update.
    #[serde(default)]
    pub previous: Vec<String>,
}

impl ScopeUpdatePayload {
    /// The granted scopes as the comma-separated form stored on sessions.
    #[must_use]
    pub fn current_joined(&self) -> String {
        self.current.join(",")
    }
}

/// Delivery metadata carried in request headers.
///
/// Extraction is lenient: a missing or unparseable header leaves its field
/// `None` rather than failing the request, since signature verification has
/// already authenticated the delivery by the time this is read.
#[derive(Debug, Clone, Default)]
pub struct WebhookMeta {
    pub topic: Option<WebhookTopic>,
    pub shop_domain: Option<ShopDomain>,
    pub webhook_id: Option<String>,
    pub api_version: Option<String>,
}

impl WebhookMeta {
    /// Read delivery metadata from request headers.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            topic: header_str(headers, TOPIC_HEADER).and_then(|v| v.parse().ok()),
            shop_domain: header_str(headers, SHOP_DOMAIN_HEADER)
                .and_then(|v| ShopDomain::parse(v).ok()),
            webhook_id: header_str(headers, WEBHOOK_ID_HEADER).map(str::to_owned),
            api_version: header_str(headers, API_VERSION_HEADER).map(str::to_owned),
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
