//! Core types for Adstem.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod shop;
pub mod topic;

pub use id::*;
pub use shop::{ShopDomain, ShopDomainError};
pub use topic::{UnknownTopicError, WebhookTopic};
