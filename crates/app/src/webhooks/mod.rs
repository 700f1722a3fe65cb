//! Webhook security and compliance handling.
//!
//! Inbound deliveries flow through exactly one pipeline: raw body captured,
//! HMAC signature verified, payload parsed, handler invoked. The
//! [`WebhookVerifier`] is the sole authentication gate; nothing parses or
//! touches storage before it passes.

pub mod compliance;
pub mod payload;
pub mod registry;
pub mod verify;

pub use compliance::{
    ComplianceError, ComplianceManager, CustomerDataExport, CustomerRedactOutcome,
    ShopRedactOutcome, UninstallOutcome,
};
pub use payload::{
    API_VERSION_HEADER, CustomerRef, DataRequestRef, SHOP_DOMAIN_HEADER, ScopeUpdatePayload,
    TOPIC_HEADER, WEBHOOK_ID_HEADER, WebhookMeta, WebhookPayload,
};
pub use registry::{ConfigReport, HandlerKind, MandatoryReport, TopicEntry, WebhookRegistry};
pub use verify::{
    HUB_SIGNATURE_HEADER, SHOPIFY_HMAC_HEADER, VerifyError, WebhookVerifier, compute_signature,
};
