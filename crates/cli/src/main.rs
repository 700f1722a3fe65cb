//! Adstem CLI - Database migrations and operational checks.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! adstem migrate
//!
//! # Validate the webhook secret and handler configuration
//! adstem check
//!
//! # List the webhook topics the app subscribes to
//! adstem webhooks topics
//!
//! # Check registered topics against the mandatory set
//! adstem webhooks verify --registered customers/redact,shop/redact
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `check` - Validate webhook configuration
//! - `webhooks` - Webhook subscription tools

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "adstem")]
#[command(author, version, about = "Adstem CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Validate webhook secret and handler configuration
    Check,
    /// Webhook subscription tools
    Webhooks {
        #[command(subcommand)]
        action: WebhooksAction,
    },
}

#[derive(Subcommand)]
enum WebhooksAction {
    /// List the topics the app subscribes to
    Topics,
    /// Check a comma-separated registered-topic list against the mandatory set
    Verify {
        /// Topics currently registered with the platform
        #[arg(short, long, value_delimiter = ',')]
        registered: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Check => commands::check::run()?,
        Commands::Webhooks { action } => match action {
            WebhooksAction::Topics => commands::webhooks::topics(),
            WebhooksAction::Verify { registered } => commands::webhooks::verify(&registered)?,
        },
    }
    Ok(())
}
