//! CLI command implementations.

pub mod check;
pub mod migrate;
pub mod webhooks;
