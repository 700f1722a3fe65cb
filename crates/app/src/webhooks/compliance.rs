//! Compliance webhook handlers.
//!
//! Implements the data-subject-rights operations behind the mandatory
//! privacy topics plus the app lifecycle topics. Handlers assume the
//! delivery has already passed signature verification. Redaction is
//! idempotent by construction: deletes count affected rows, and a
//! redelivered request simply deletes zero.

use std::sync::Arc;

use adstem_core::ShopDomain;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument};

use crate::db::{ConnectorStore, RepositoryError, SessionExport, SessionStore};

use super::payload::{CustomerRef, ScopeUpdatePayload, WebhookPayload};

/// Compliance handler failure.
#[derive(Debug, Error)]
pub enum ComplianceError {
    /// Payload lacks the customer object a customer-scoped topic requires.
    #[error("Missing customer in webhook payload")]
    MissingCustomer,

    /// Session or connector store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] RepositoryError),
}

/// Structured export returned for a `customers/data_request`.
///
/// Contains everything this app holds about the customer's shop:
/// session records (token-free) and the customer identity echoed back.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerDataExport {
    pub customer: CustomerRef,
    pub sessions: Vec<SessionExport>,
    pub shop_domain: ShopDomain,
    pub requested_at: DateTime<Utc>,
}

/// Result of a `customers/redact`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomerRedactOutcome {
    pub deleted_sessions: u64,
}

/// Result of a `shop/redact`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShopRedactOutcome {
    pub deleted_sessions: u64,
    pub connector_deleted: bool,
}

/// Result of an `app/uninstalled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UninstallOutcome {
    pub deleted_sessions: u64,
    pub connector_deactivated: bool,
}

/// Executes compliance operations against the session and connector stores.
#[derive(Clone)]
pub struct ComplianceManager {
    sessions: Arc<dyn SessionStore>,
    connectors: Arc<dyn ConnectorStore>,
}

impl std::fmt::Debug for ComplianceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComplianceManager").finish_non_exhaustive()
    }
}

impl ComplianceManager {
    /// Create a manager over the given stores.
    #[must_use]
    pub fn new(sessions: Arc<dyn SessionStore>, connectors: Arc<dyn ConnectorStore>) -> Self {
        Self {
            sessions,
            connectors,
        }
    }

    /// Assemble the data export for a `customers/data_request`.
    ///
    /// Read-only: collects the shop's session records without mutating
    /// anything. The merchant relays the export to the customer out of band.
    ///
    /// # Errors
    ///
    /// Returns [`ComplianceError::MissingCustomer`] when the payload carries
    /// no customer object, or a store error.
    #[instrument(skip(self, payload), fields(shop = %payload.shop_domain))]
    pub async fn customer_data_request(
        &self,
        payload: &WebhookPayload,
    ) -> Result<CustomerDataExport, ComplianceError> {
        let customer = payload
            .customer
            .as_ref()
            .ok_or(ComplianceError::MissingCustomer)?;

        let sessions = self.sessions.sessions_for_shop(&payload.shop_domain).await?;

        info!(
            customer_id = %customer.id,
            data_request_id = ?payload.data_request.as_ref().map(|r| r.id),
            sessions = sessions.len(),
            "Customer data export assembled"
        );

        Ok(CustomerDataExport {
            customer: customer.clone(),
            sessions: sessions.iter().map(SessionExport::from).collect(),
            shop_domain: payload.shop_domain.clone(),
            requested_at: Utc::now(),
        })
    }

    /// Erase a customer's sessions for the shop (`customers/redact`).
    ///
    /// Deletes rows matching the shop AND the customer id. Redelivery
    /// deletes zero rows and succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`ComplianceError::MissingCustomer`] when the payload carries
    /// no customer object, or a store error.
    #[instrument(skip(self, payload), fields(shop = %payload.shop_domain))]
    pub async fn customer_redact(
        &self,
        payload: &WebhookPayload,
    ) -> Result<CustomerRedactOutcome, ComplianceError> {
        let customer = payload
            .customer
            .as_ref()
            .ok_or(ComplianceError::MissingCustomer)?;

        let deleted_sessions = self
            .sessions
            .delete_for_customer(&payload.shop_domain, customer.id)
            .await?;

        info!(
            customer_id = %customer.id,
            deleted = deleted_sessions,
            "Customer sessions redacted"
        );

        Ok(CustomerRedactOutcome { deleted_sessions })
    }

    /// Erase everything held for a shop (`shop/redact`).
    ///
    /// Deletes all of the shop's sessions and its connector configuration.
    /// Redelivery deletes zero rows and succeeds.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    #[instrument(skip(self, payload), fields(shop = %payload.shop_domain))]
    pub async fn shop_redact(
        &self,
        payload: &WebhookPayload,
    ) -> Result<ShopRedactOutcome, ComplianceError> {
        let deleted_sessions = self.sessions.delete_for_shop(&payload.shop_domain).await?;
        let connector_deleted = self.connectors.delete(&payload.shop_domain).await?;

        info!(
            deleted = deleted_sessions,
            connector_deleted, "Shop data redacted"
        );

        Ok(ShopRedactOutcome {
            deleted_sessions,
            connector_deleted,
        })
    }

    /// Tear down a shop's state on `app/uninstalled`.
    ///
    /// Sessions are deleted immediately; the connector configuration is kept
    /// but deactivated, since Shopify sends `shop/redact` 48 hours later for
    /// the full erasure.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    #[instrument(skip(self), fields(shop = %shop))]
    pub async fn app_uninstalled(
        &self,
        shop: &ShopDomain,
    ) -> Result<UninstallOutcome, ComplianceError> {
        let deleted_sessions = self.sessions.delete_for_shop(shop).await?;
        let connector_deactivated = self.connectors.deactivate(shop).await?;

        info!(
            deleted = deleted_sessions,
            connector_deactivated, "Shop uninstalled"
        );

        Ok(UninstallOutcome {
            deleted_sessions,
            connector_deactivated,
        })
    }

    /// Record a scope change on `app/scopes_update`.
    ///
    /// Rewrites the scope column on the shop's sessions so later API calls
    /// see the granted set. Returns the number of sessions updated.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    #[instrument(skip(self, payload), fields(shop = %shop))]
    pub async fn scopes_update(
        &self,
        shop: &ShopDomain,
        payload: &ScopeUpdatePayload,
    ) -> Result<u64, ComplianceError> {
        let scope = payload.current_joined();
        let updated = self.sessions.update_scope_for_shop(shop, &scope).await?;

        info!(
            updated,
            current = %scope,
            previous = %payload.previous.join(","),
            "Access scopes updated"
        );

        Ok(updated)
    }
}
