//! Connector configuration store.
//!
//! One row per shop, keyed by shop domain. A shop gets a row when the
//! merchant links an ad connector through the connector API; uninstall
//! deactivates it and shop redaction deletes it outright.

use std::collections::HashMap;

use adstem_core::ShopDomain;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tokio::sync::RwLock;

use super::RepositoryError;

// =============================================================================
// Types
// =============================================================================

/// A shop's connector configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectorConfig {
    /// Shop the configuration belongs to.
    pub shop: ShopDomain,
    /// Upstream connector identifier, if one has been linked.
    pub connector_id: Option<String>,
    /// Whether reports should be pushed for this shop.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Internal row type for `PostgreSQL` queries.
#[derive(Debug, sqlx::FromRow)]
struct ConnectorRow {
    shop: String,
    connector_id: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ConnectorRow> for ConnectorConfig {
    type Error = RepositoryError;

    fn try_from(row: ConnectorRow) -> Result<Self, Self::Error> {
        let shop = ShopDomain::parse(&row.shop).map_err(|e| {
            RepositoryError::DataCorruption(format!(
                "connector config has invalid shop {:?}: {e}",
                row.shop
            ))
        })?;

        Ok(Self {
            shop,
            connector_id: row.connector_id,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Store trait
// =============================================================================

/// Access to the connector configuration table.
#[async_trait]
pub trait ConnectorStore: Send + Sync {
    /// Fetch a shop's connector configuration, if any.
    async fn get(&self, shop: &ShopDomain) -> Result<Option<ConnectorConfig>, RepositoryError>;

    /// Insert or update a shop's configuration, returning the stored row.
    async fn upsert(
        &self,
        shop: &ShopDomain,
        connector_id: Option<&str>,
        is_active: bool,
    ) -> Result<ConnectorConfig, RepositoryError>;

    /// Mark a shop's configuration inactive. Returns `false` when the shop
    /// had no configuration.
    async fn deactivate(&self, shop: &ShopDomain) -> Result<bool, RepositoryError>;

    /// Delete a shop's configuration. Returns `false` when the shop had no
    /// configuration; deleting twice is not an error.
    async fn delete(&self, shop: &ShopDomain) -> Result<bool, RepositoryError>;
}

// =============================================================================
// PostgreSQL implementation
// =============================================================================

/// `PostgreSQL`-backed connector store.
#[derive(Debug, Clone)]
pub struct PgConnectorStore {
    pool: PgPool,
}

impl PgConnectorStore {
    /// Create a new connector store over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConnectorStore for PgConnectorStore {
    async fn get(&self, shop: &ShopDomain) -> Result<Option<ConnectorConfig>, RepositoryError> {
        let row: Option<ConnectorRow> = sqlx::query_as(
            r"
            SELECT shop, connector_id, is_active, created_at, updated_at
            FROM connector_configs
            WHERE shop = $1
            ",
        )
        .bind(shop.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(ConnectorConfig::try_from).transpose()
    }

    async fn upsert(
        &self,
        shop: &ShopDomain,
        connector_id: Option<&str>,
        is_active: bool,
    ) -> Result<ConnectorConfig, RepositoryError> {
        let row: ConnectorRow = sqlx::query_as(
            r"
            INSERT INTO connector_configs (shop, connector_id, is_active)
            VALUES ($1, $2, $3)
            ON CONFLICT (shop) DO UPDATE SET
                connector_id = EXCLUDED.connector_id,
                is_active = EXCLUDED.is_active,
                updated_at = NOW()
            RETURNING shop, connector_id, is_active, created_at, updated_at
            ",
        )
        .bind(shop.as_str())
        .bind(connector_id)
        .bind(is_active)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn deactivate(&self, shop: &ShopDomain) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE connector_configs SET is_active = FALSE, updated_at = NOW() WHERE shop = $1",
        )
        .bind(shop.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, shop: &ShopDomain) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM connector_configs WHERE shop = $1")
            .bind(shop.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// In-memory implementation
// =============================================================================

/// In-memory connector store for tests and local development.
#[derive(Debug, Default)]
pub struct MemoryConnectorStore {
    configs: RwLock<HashMap<String, ConnectorConfig>>,
}

impl MemoryConnectorStore {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectorStore for MemoryConnectorStore {
    async fn get(&self, shop: &ShopDomain) -> Result<Option<ConnectorConfig>, RepositoryError> {
        Ok(self.configs.read().await.get(shop.as_str()).cloned())
    }

    async fn upsert(
        &self,
        shop: &ShopDomain,
        connector_id: Option<&str>,
        is_active: bool,
    ) -> Result<ConnectorConfig, RepositoryError> {
        let mut configs = self.configs.write().await;
        let now = Utc::now();
        let created_at = configs.get(shop.as_str()).map_or(now, |c| c.created_at);

        let config = ConnectorConfig {
            shop: shop.clone(),
            connector_id: connector_id.map(str::to_owned),
            is_active,
            created_at,
            updated_at: now,
        };
        configs.insert(shop.as_str().to_owned(), config.clone());
        Ok(config)
    }

    async fn deactivate(&self, shop: &ShopDomain) -> Result<bool, RepositoryError> {
        let mut configs = self.configs.write().await;
        match configs.get_mut(shop.as_str()) {
            Some(config) => {
                config.is_active = false;
                config.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, shop: &ShopDomain) -> Result<bool, RepositoryError> {
        Ok(self.configs.write().await.remove(shop.as_str()).is_some())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn shop(domain: &str) -> ShopDomain {
        ShopDomain::parse(domain).unwrap()
    }

    #[tokio::test]
    async fn test_get_returns_none_for_unknown_shop() {
        let store = MemoryConnectorStore::new();
        let config = store.get(&shop("one.myshopify.com")).await.unwrap();
        assert!(config.is_none());
    }

    #[tokio::test]
    async fn test_upsert_then_get() {
        let store = MemoryConnectorStore::new();
        store
            .upsert(&shop("one.myshopify.com"), Some("conn-42"), true)
            .await
            .unwrap();

        let config = store.get(&shop("one.myshopify.com")).await.unwrap().unwrap();
        assert_eq!(config.connector_id.as_deref(), Some("conn-42"));
        assert!(config.is_active);
    }

    #[tokio::test]
    async fn test_upsert_preserves_created_at() {
        let store = MemoryConnectorStore::new();
        let first = store
            .upsert(&shop("one.myshopify.com"), Some("conn-42"), true)
            .await
            .unwrap();
        let second = store
            .upsert(&shop("one.myshopify.com"), Some("conn-43"), false)
            .await
            .unwrap();

        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.connector_id.as_deref(), Some("conn-43"));
        assert!(!second.is_active);
    }

    #[tokio::test]
    async fn test_deactivate_keeps_row() {
        let store = MemoryConnectorStore::new();
        store
            .upsert(&shop("one.myshopify.com"), Some("conn-42"), true)
            .await
            .unwrap();

        assert!(store.deactivate(&shop("one.myshopify.com")).await.unwrap());

        let config = store.get(&shop("one.myshopify.com")).await.unwrap().unwrap();
        assert!(!config.is_active);
        assert_eq!(config.connector_id.as_deref(), Some("conn-42"));
    }

    #[tokio::test]
    async fn test_deactivate_missing_shop_returns_false() {
        let store = MemoryConnectorStore::new();
        assert!(!store.deactivate(&shop("one.myshopify.com")).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryConnectorStore::new();
        store
            .upsert(&shop("one.myshopify.com"), None, true)
            .await
            .unwrap();

        assert!(store.delete(&shop("one.myshopify.com")).await.unwrap());
        assert!(!store.delete(&shop("one.myshopify.com")).await.unwrap());
    }

    #[test]
    fn test_row_conversion_rejects_invalid_shop() {
        let row = ConnectorRow {
            shop: "no-dot-here".to_owned(),
            connector_id: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let err = ConnectorConfig::try_from(row).unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }
}
