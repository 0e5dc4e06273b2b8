//! Mobistore Core - Shared types library.
//!
//! This crate provides common types used across all Mobistore components:
//! - `storefront` - Public-facing headless storefront server
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money amounts, and
//!   order/payment/receive enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
