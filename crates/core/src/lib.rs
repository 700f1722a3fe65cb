//! Adstem Core - Shared types library.
//!
//! This crate provides common types used across all Adstem components:
//! - `app` - The embedded-app backend (webhook intake, connector API)
//! - `cli` - Command-line tools for migrations and configuration checks
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, shop domains, and
//!   webhook topics

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
