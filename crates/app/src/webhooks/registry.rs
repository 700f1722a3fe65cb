//! Webhook topic registry.
//!
//! An immutable table mapping each subscribed topic to its handler and
//! required flag, constructed once at startup and injected wherever
//! dispatch or validation needs it. Routes consult this table rather than
//! any ambient global state.

use std::collections::HashSet;

use adstem_core::WebhookTopic;
use secrecy::ExposeSecret;
use serde::Serialize;

use crate::config::{AppConfig, MIN_WEBHOOK_SECRET_LENGTH};

/// The compliance operation backing a registered topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// Export the data held for a customer.
    CustomerDataRequest,
    /// Erase a customer's data for one shop.
    CustomerRedact,
    /// Erase everything held for a shop.
    ShopRedact,
    /// Tear down a shop's state on uninstall.
    Uninstall,
    /// Record a change to granted access scopes.
    ScopesUpdate,
}

/// One row of the registry table.
#[derive(Debug, Clone, Copy)]
pub struct TopicEntry {
    pub topic: WebhookTopic,
    pub handler: HandlerKind,
    /// Whether Shopify requires this subscription for app review.
    pub mandatory: bool,
}

/// Result of checking registered topics against the mandatory set.
#[derive(Debug, Clone, Serialize)]
pub struct MandatoryReport {
    pub valid: bool,
    /// Mandatory topics absent from the registered set, in table order.
    pub missing: Vec<String>,
}

/// Result of validating secret and handler configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigReport {
    pub valid: bool,
    pub issues: Vec<String>,
}

/// Immutable topic-to-handler table.
#[derive(Debug, Clone)]
pub struct WebhookRegistry {
    entries: Vec<TopicEntry>,
}

impl WebhookRegistry {
    /// Build a registry from an explicit table.
    #[must_use]
    pub const fn new(entries: Vec<TopicEntry>) -> Self {
        Self { entries }
    }

    /// The standard subscription table: the three privacy topics plus the
    /// app lifecycle topics.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(vec![
            TopicEntry {
                topic: WebhookTopic::CustomersDataRequest,
                handler: HandlerKind::CustomerDataRequest,
                mandatory: true,
            },
            TopicEntry {
                topic: WebhookTopic::CustomersRedact,
                handler: HandlerKind::CustomerRedact,
                mandatory: true,
            },
            TopicEntry {
                topic: WebhookTopic::ShopRedact,
                handler: HandlerKind::ShopRedact,
                mandatory: true,
            },
            TopicEntry {
                topic: WebhookTopic::AppUninstalled,
                handler: HandlerKind::Uninstall,
                mandatory: false,
            },
            TopicEntry {
                topic: WebhookTopic::AppScopesUpdate,
                handler: HandlerKind::ScopesUpdate,
                mandatory: false,
            },
        ])
    }

    /// Find the entry for a topic, if subscribed.
    #[must_use]
    pub fn lookup(&self, topic: WebhookTopic) -> Option<&TopicEntry> {
        self.entries.iter().find(|e| e.topic == topic)
    }

    /// All registered entries, in declaration order.
    #[must_use]
    pub fn entries(&self) -> &[TopicEntry] {
        &self.entries
    }

    /// Check that every mandatory topic appears in `registered`.
    ///
    /// `registered` is the set of topic names actually subscribed with the
    /// platform, as reported by the Shopify admin API or app configuration.
    #[must_use]
    pub fn validate_mandatory(&self, registered: &HashSet<String>) -> MandatoryReport {
        let missing: Vec<String> = self
            .entries
            .iter()
            .filter(|e| e.mandatory)
            .map(|e| e.topic.as_str().to_owned())
            .filter(|topic| !registered.contains(topic))
            .collect();

        MandatoryReport {
            valid: missing.is_empty(),
            missing,
        }
    }

    /// Validate secret and handler configuration, accumulating every issue
    /// found rather than stopping at the first.
    #[must_use]
    pub fn validate_configuration(&self, config: &AppConfig) -> ConfigReport {
        let mut issues = Vec::new();

        let secret = config.webhook_secret.expose_secret();
        if secret.is_empty() {
            issues.push("webhook signing secret is empty".to_owned());
        } else if secret.len() < MIN_WEBHOOK_SECRET_LENGTH {
            issues.push(format!(
                "webhook signing secret is shorter than {MIN_WEBHOOK_SECRET_LENGTH} characters"
            ));
        }

        for topic in WebhookTopic::MANDATORY {
            match self.lookup(topic) {
                None => {
                    issues.push(format!("no handler registered for mandatory topic {topic}"));
                }
                Some(entry) if !entry.mandatory => {
                    issues.push(format!("mandatory topic {topic} is not flagged mandatory"));
                }
                Some(_) => {}
            }
        }

        let mut seen = HashSet::new();
        for entry in &self.entries {
            if !seen.insert(entry.topic) {
                issues.push(format!(
                    "topic {} is registered more than once",
                    entry.topic
                ));
            }
        }

        ConfigReport {
            valid: issues.is_empty(),
            issues,
        }
    }
}

impl Default for WebhookRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
