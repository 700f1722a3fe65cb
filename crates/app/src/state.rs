//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::db::{ConnectorStore, PgConnectorStore, PgSessionStore, SessionStore};
use crate::services::{SyncClient, SyncError};
use crate::webhooks::{ComplianceManager, WebhookRegistry, WebhookVerifier};

/// Error assembling application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("sync client error: {0}")]
    Sync(#[from] SyncError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources: the stores, the webhook verifier and registry, and
/// the optional sync client. Everything here is immutable after startup.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    pool: Option<PgPool>,
    sessions: Arc<dyn SessionStore>,
    connectors: Arc<dyn ConnectorStore>,
    compliance: ComplianceManager,
    registry: WebhookRegistry,
    verifier: WebhookVerifier,
    sync: Option<SyncClient>,
}

impl AppState {
    /// Create application state backed by `PostgreSQL` stores.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync client cannot be built from the
    /// configuration.
    pub fn new(config: AppConfig, pool: PgPool) -> Result<Self, StateError> {
        let sessions: Arc<dyn SessionStore> = Arc::new(PgSessionStore::new(pool.clone()));
        let connectors: Arc<dyn ConnectorStore> = Arc::new(PgConnectorStore::new(pool.clone()));

        Self::assemble(config, Some(pool), sessions, connectors)
    }

    /// Create application state over caller-provided stores.
    ///
    /// Used by tests and database-less local runs; no connection pool is
    /// held, so the readiness probe reports ready unconditionally.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync client cannot be built from the
    /// configuration.
    pub fn with_stores(
        config: AppConfig,
        sessions: Arc<dyn SessionStore>,
        connectors: Arc<dyn ConnectorStore>,
    ) -> Result<Self, StateError> {
        Self::assemble(config, None, sessions, connectors)
    }

    fn assemble(
        config: AppConfig,
        pool: Option<PgPool>,
        sessions: Arc<dyn SessionStore>,
        connectors: Arc<dyn ConnectorStore>,
    ) -> Result<Self, StateError> {
        let compliance = ComplianceManager::new(sessions.clone(), connectors.clone());
        let registry = WebhookRegistry::with_defaults();
        let verifier = WebhookVerifier::new(config.webhook_secret.clone());
        let sync = config.sync().map(SyncClient::new).transpose()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                sessions,
                connectors,
                compliance,
                registry,
                verifier,
                sync,
            }),
        })
    }

    /// Get a reference to the app configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get the database connection pool, if one is held.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// Get the session store.
    #[must_use]
    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.inner.sessions
    }

    /// Get the connector store.
    #[must_use]
    pub fn connectors(&self) -> &Arc<dyn ConnectorStore> {
        &self.inner.connectors
    }

    /// Get the compliance manager.
    #[must_use]
    pub fn compliance(&self) -> &ComplianceManager {
        &self.inner.compliance
    }

    /// Get the webhook registry.
    #[must_use]
    pub fn registry(&self) -> &WebhookRegistry {
        &self.inner.registry
    }

    /// Get the webhook signature verifier.
    #[must_use]
    pub fn verifier(&self) -> &WebhookVerifier {
        &self.inner.verifier
    }

    /// Get the ads platform sync client, if syncing is configured.
    #[must_use]
    pub fn sync(&self) -> Option<&SyncClient> {
        self.inner.sync.as_ref()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use crate::db::{MemoryConnectorStore, MemorySessionStore};

    use super::*;

    fn test_config() -> AppConfig {
        AppConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3002,
            base_url: "http://localhost:3002".to_string(),
            webhook_secret: SecretString::from("x".repeat(32)),
            sync: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
        }
    }

    #[test]
    fn test_with_stores() {
        let state = AppState::with_stores(
            test_config(),
            Arc::new(MemorySessionStore::new()),
            Arc::new(MemoryConnectorStore::new()),
        )
        .unwrap();

        assert!(state.pool().is_none());
        assert!(state.sync().is_none());
        assert_eq!(state.registry().entries().len(), 5);
        assert_eq!(state.config().port, 3002);
    }

    #[test]
    fn test_sync_client_built_when_configured() {
        let mut config = test_config();
        config.sync = Some(crate::config::SyncConfig {
            api_url: url::Url::parse("https://ingest.ads.example.net/v1/reports").unwrap(),
            api_key: SecretString::from("sk_live_abc123"),
        });

        let state = AppState::with_stores(
            config,
            Arc::new(MemorySessionStore::new()),
            Arc::new(MemoryConnectorStore::new()),
        )
        .unwrap();

        assert!(state.sync().is_some());
    }
}
