//! Webhook configuration validation.
//!
//! # Usage
//!
//! ```bash
//! adstem check
//! ```
//!
//! Loads the app configuration from the environment and validates the
//! webhook signing secret and handler table. Exits non-zero when any
//! issue is found, so it can run as a deploy gate.

use adstem_app::config::{AppConfig, ConfigError};
use adstem_app::webhooks::WebhookRegistry;

#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0} configuration issue(s) found")]
    Invalid(usize),
}

/// Validate the webhook secret and handler configuration.
pub fn run() -> Result<(), CheckError> {
    let config = AppConfig::from_env()?;
    let registry = WebhookRegistry::with_defaults();
    let report = registry.validate_configuration(&config);

    #[allow(clippy::print_stdout)]
    {
        if report.valid {
            println!("Webhook configuration OK ({} topics)", registry.entries().len());
        } else {
            println!("Webhook configuration issues:");
            for issue in &report.issues {
                println!("  - {issue}");
            }
        }
    }

    if report.valid {
        Ok(())
    } else {
        Err(CheckError::Invalid(report.issues.len()))
    }
}
