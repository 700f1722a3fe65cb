//! Session store over the platform auth library's session rows.
//!
//! The auth library writes these rows during OAuth; this app only ever
//! reads them (data exports) and deletes or rewrites them (redaction,
//! uninstall, scope updates). All access goes through the [`SessionStore`]
//! trait so compliance logic can be tested against [`MemorySessionStore`].

use std::collections::HashMap;

use adstem_core::{CustomerId, ShopDomain};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use sqlx::PgPool;
use tokio::sync::RwLock;

use super::RepositoryError;

// =============================================================================
// Types
// =============================================================================

/// A Shopify session row.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct SessionRecord {
    /// Session id assigned by the platform auth library.
    pub id: String,
    /// Shop the session belongs to.
    pub shop: ShopDomain,
    /// OAuth state parameter.
    pub state: String,
    /// Whether this is an online (per-user) session.
    pub is_online: bool,
    /// Granted access scopes, comma-separated.
    pub scope: Option<String>,
    /// Expiry of online sessions.
    pub expires: Option<DateTime<Utc>>,
    /// OAuth access token (redacted in debug output, never serialized).
    pub access_token: Option<SecretString>,
    /// Shopify user id for online sessions; customer redaction matches on this.
    pub user_id: Option<i64>,
}

impl std::fmt::Debug for SessionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRecord")
            .field("id", &self.id)
            .field("shop", &self.shop)
            .field("is_online", &self.is_online)
            .field("scope", &self.scope)
            .field("expires", &self.expires)
            .field("access_token", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

/// Token-free view of a session, safe to serialize into a data export.
#[derive(Debug, Clone, Serialize)]
pub struct SessionExport {
    pub id: String,
    pub shop: ShopDomain,
    pub is_online: bool,
    pub scope: Option<String>,
    pub expires: Option<DateTime<Utc>>,
    pub user_id: Option<i64>,
}

impl From<&SessionRecord> for SessionExport {
    fn from(record: &SessionRecord) -> Self {
        Self {
            id: record.id.clone(),
            shop: record.shop.clone(),
            is_online: record.is_online,
            scope: record.scope.clone(),
            expires: record.expires,
            user_id: record.user_id,
        }
    }
}

/// Internal row type for `PostgreSQL` queries.
#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    id: String,
    shop: String,
    state: String,
    is_online: bool,
    scope: Option<String>,
    expires: Option<DateTime<Utc>>,
    access_token: Option<String>,
    user_id: Option<i64>,
}

impl TryFrom<SessionRow> for SessionRecord {
    type Error = RepositoryError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        let shop = ShopDomain::parse(&row.shop).map_err(|e| {
            RepositoryError::DataCorruption(format!("session {} has invalid shop: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            shop,
            state: row.state,
            is_online: row.is_online,
            scope: row.scope,
            expires: row.expires,
            access_token: row.access_token.map(SecretString::from),
            user_id: row.user_id,
        })
    }
}

// =============================================================================
// Store trait
// =============================================================================

/// Access to the session table.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert or replace a session row.
    async fn upsert(&self, session: &SessionRecord) -> Result<(), RepositoryError>;

    /// All sessions belonging to a shop.
    async fn sessions_for_shop(
        &self,
        shop: &ShopDomain,
    ) -> Result<Vec<SessionRecord>, RepositoryError>;

    /// Delete every session belonging to a shop. Returns the deleted count;
    /// deleting an absent shop is not an error (count 0).
    async fn delete_for_shop(&self, shop: &ShopDomain) -> Result<u64, RepositoryError>;

    /// Delete the shop's sessions whose `user_id` matches the customer.
    /// Returns the deleted count; absent rows are not an error (count 0).
    async fn delete_for_customer(
        &self,
        shop: &ShopDomain,
        customer: CustomerId,
    ) -> Result<u64, RepositoryError>;

    /// Rewrite the scope column on all of a shop's sessions. Returns the
    /// number of rows updated.
    async fn update_scope_for_shop(
        &self,
        shop: &ShopDomain,
        scope: &str,
    ) -> Result<u64, RepositoryError>;
}

// =============================================================================
// PostgreSQL implementation
// =============================================================================

/// `PostgreSQL`-backed session store.
#[derive(Debug, Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    /// Create a new session store over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn upsert(&self, session: &SessionRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO sessions (id, shop, state, is_online, scope, expires, access_token, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                shop = EXCLUDED.shop,
                state = EXCLUDED.state,
                is_online = EXCLUDED.is_online,
                scope = EXCLUDED.scope,
                expires = EXCLUDED.expires,
                access_token = EXCLUDED.access_token,
                user_id = EXCLUDED.user_id,
                updated_at = NOW()
            ",
        )
        .bind(&session.id)
        .bind(session.shop.as_str())
        .bind(&session.state)
        .bind(session.is_online)
        .bind(&session.scope)
        .bind(session.expires)
        .bind(session.access_token.as_ref().map(ExposeSecret::expose_secret))
        .bind(session.user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn sessions_for_shop(
        &self,
        shop: &ShopDomain,
    ) -> Result<Vec<SessionRecord>, RepositoryError> {
        let rows: Vec<SessionRow> = sqlx::query_as(
            r"
            SELECT id, shop, state, is_online, scope, expires, access_token, user_id
            FROM sessions
            WHERE shop = $1
            ORDER BY id
            ",
        )
        .bind(shop.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SessionRecord::try_from).collect()
    }

    async fn delete_for_shop(&self, shop: &ShopDomain) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM sessions WHERE shop = $1")
            .bind(shop.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_for_customer(
        &self,
        shop: &ShopDomain,
        customer: CustomerId,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM sessions WHERE shop = $1 AND user_id = $2")
            .bind(shop.as_str())
            .bind(customer)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn update_scope_for_shop(
        &self,
        shop: &ShopDomain,
        scope: &str,
    ) -> Result<u64, RepositoryError> {
        let result =
            sqlx::query("UPDATE sessions SET scope = $2, updated_at = NOW() WHERE shop = $1")
                .bind(shop.as_str())
                .bind(scope)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected())
    }
}

// =============================================================================
// In-memory implementation
// =============================================================================

/// In-memory session store for tests and local development.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl MemorySessionStore {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions currently held (test helper).
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether the store is empty (test helper).
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn upsert(&self, session: &SessionRecord) -> Result<(), RepositoryError> {
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn sessions_for_shop(
        &self,
        shop: &ShopDomain,
    ) -> Result<Vec<SessionRecord>, RepositoryError> {
        let mut sessions: Vec<SessionRecord> = self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| s.shop == *shop)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(sessions)
    }

    #[allow(clippy::cast_possible_truncation)]
    async fn delete_for_shop(&self, shop: &ShopDomain) -> Result<u64, RepositoryError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.shop != *shop);
        Ok((before - sessions.len()) as u64)
    }

    #[allow(clippy::cast_possible_truncation)]
    async fn delete_for_customer(
        &self,
        shop: &ShopDomain,
        customer: CustomerId,
    ) -> Result<u64, RepositoryError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !(s.shop == *shop && s.user_id == Some(customer.as_i64())));
        Ok((before - sessions.len()) as u64)
    }

    async fn update_scope_for_shop(
        &self,
        shop: &ShopDomain,
        scope: &str,
    ) -> Result<u64, RepositoryError> {
        let mut sessions = self.sessions.write().await;
        let mut updated = 0;
        for session in sessions.values_mut().filter(|s| s.shop == *shop) {
            session.scope = Some(scope.to_owned());
            updated += 1;
        }
        Ok(updated)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn shop(domain: &str) -> ShopDomain {
        ShopDomain::parse(domain).unwrap()
    }

    fn session(id: &str, shop_domain: &str, user_id: Option<i64>) -> SessionRecord {
        SessionRecord {
            id: id.to_owned(),
            shop: shop(shop_domain),
            state: String::new(),
            is_online: user_id.is_some(),
            scope: Some("read_orders".to_owned()),
            expires: None,
            access_token: Some(SecretString::from("shpat_abc123")),
            user_id,
        }
    }

    #[tokio::test]
    async fn test_delete_for_shop_is_idempotent() {
        let store = MemorySessionStore::new();
        store.upsert(&session("a", "one.myshopify.com", None)).await.unwrap();
        store.upsert(&session("b", "one.myshopify.com", None)).await.unwrap();
        store.upsert(&session("c", "two.myshopify.com", None)).await.unwrap();

        let first = store.delete_for_shop(&shop("one.myshopify.com")).await.unwrap();
        assert_eq!(first, 2);

        let second = store.delete_for_shop(&shop("one.myshopify.com")).await.unwrap();
        assert_eq!(second, 0);

        // Other shops untouched
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_delete_for_customer_only_deletes_matches() {
        let store = MemorySessionStore::new();
        store.upsert(&session("a", "one.myshopify.com", Some(7))).await.unwrap();
        store.upsert(&session("b", "one.myshopify.com", Some(8))).await.unwrap();
        store.upsert(&session("c", "one.myshopify.com", None)).await.unwrap();
        store.upsert(&session("d", "two.myshopify.com", Some(7))).await.unwrap();

        let deleted = store
            .delete_for_customer(&shop("one.myshopify.com"), CustomerId::new(7))
            .await
            .unwrap();
        assert_eq!(deleted, 1);

        // Same customer on another shop, offline sessions, and other
        // customers all survive.
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn test_update_scope_rewrites_all_shop_sessions() {
        let store = MemorySessionStore::new();
        store.upsert(&session("a", "one.myshopify.com", None)).await.unwrap();
        store.upsert(&session("b", "one.myshopify.com", Some(1))).await.unwrap();
        store.upsert(&session("c", "two.myshopify.com", None)).await.unwrap();

        let updated = store
            .update_scope_for_shop(&shop("one.myshopify.com"), "read_orders,write_products")
            .await
            .unwrap();
        assert_eq!(updated, 2);

        for record in store.sessions_for_shop(&shop("one.myshopify.com")).await.unwrap() {
            assert_eq!(record.scope.as_deref(), Some("read_orders,write_products"));
        }
        let other = store.sessions_for_shop(&shop("two.myshopify.com")).await.unwrap();
        let untouched = other.first().unwrap();
        assert_eq!(untouched.scope.as_deref(), Some("read_orders"));
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing_row() {
        let store = MemorySessionStore::new();
        store.upsert(&session("a", "one.myshopify.com", None)).await.unwrap();

        let mut replacement = session("a", "one.myshopify.com", Some(42));
        replacement.scope = Some("write_products".to_owned());
        store.upsert(&replacement).await.unwrap();

        assert_eq!(store.len().await, 1);
        let rows = store.sessions_for_shop(&shop("one.myshopify.com")).await.unwrap();
        let row = rows.first().unwrap();
        assert_eq!(row.user_id, Some(42));
        assert_eq!(row.scope.as_deref(), Some("write_products"));
    }

    #[test]
    fn test_debug_redacts_access_token() {
        let record = session("a", "one.myshopify.com", None);
        let debug_output = format!("{record:?}");

        assert!(debug_output.contains("one.myshopify.com"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("shpat_abc123"));
    }

    #[test]
    fn test_export_is_token_free() {
        let record = session("a", "one.myshopify.com", Some(7));
        let export = SessionExport::from(&record);
        let json = serde_json::to_string(&export).unwrap();

        assert!(json.contains("one.myshopify.com"));
        assert!(json.contains("\"user_id\":7"));
        assert!(!json.contains("access_token"));
        assert!(!json.contains("shpat_abc123"));
    }

    #[test]
    fn test_row_conversion_rejects_invalid_shop() {
        let row = SessionRow {
            id: "a".to_owned(),
            shop: "not a domain".to_owned(),
            state: String::new(),
            is_online: false,
            scope: None,
            expires: None,
            access_token: None,
            user_id: None,
        };

        let err = SessionRecord::try_from(row).unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }
}
