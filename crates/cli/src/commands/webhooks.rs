//! Webhook subscription tools.
//!
//! # Usage
//!
//! ```bash
//! # List the topics the app subscribes to
//! adstem webhooks topics
//!
//! # Check registered topics against the mandatory set
//! adstem webhooks verify --registered customers/redact,shop/redact
//! ```

use std::collections::HashSet;

use adstem_app::webhooks::WebhookRegistry;
use adstem_core::WebhookTopic;

#[derive(Debug, thiserror::Error)]
#[error("missing mandatory webhook topics: {}", missing.join(", "))]
pub struct MissingTopicsError {
    pub missing: Vec<String>,
}

/// Print the webhook topics the app subscribes to.
pub fn topics() {
    let registry = WebhookRegistry::with_defaults();

    #[allow(clippy::print_stdout)]
    {
        for entry in registry.entries() {
            let flag = if entry.mandatory { "mandatory" } else { "optional" };
            println!("{:<28} {flag}", entry.topic.as_str());
        }
    }
}

/// Check a registered-topic list against the mandatory set.
pub fn verify(registered: &[String]) -> Result<(), MissingTopicsError> {
    let mut set = HashSet::new();
    for raw in registered {
        let topic = raw.trim();
        if topic.is_empty() {
            continue;
        }
        if topic.parse::<WebhookTopic>().is_err() {
            tracing::warn!(topic, "Unrecognized webhook topic in registered list");
        }
        set.insert(topic.to_string());
    }

    let registry = WebhookRegistry::with_defaults();
    let report = registry.validate_mandatory(&set);

    #[allow(clippy::print_stdout)]
    {
        if report.valid {
            println!("All mandatory webhook topics registered");
        } else {
            println!("Missing mandatory webhook topics:");
            for topic in &report.missing {
                println!("  - {topic}");
            }
        }
    }

    if report.valid {
        Ok(())
    } else {
        Err(MissingTopicsError {
            missing: report.missing,
        })
    }
}
