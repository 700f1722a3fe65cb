//! Adstem app library.
//!
//! This crate provides the connector backend as a library, allowing the
//! router, stores, and webhook machinery to be tested and reused.
//!
//! # Security
//!
//! Every webhook route is gated by HMAC-SHA256 verification of the raw
//! request body (`webhooks::verify`) before anything is parsed. There is
//! exactly one verification path; no handler runs on an unverified body.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;
pub mod webhooks;
