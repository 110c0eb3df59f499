//! EZCENTIALS Core - Shared types and order status reconciliation.
//!
//! This crate provides the domain types used across all EZCENTIALS components:
//! - `storefront` - Public-facing catalog, reviews and order status API
//! - `cli` - Command-line tools for the local order ledger and catalog
//!
//! # Architecture
//!
//! The core crate contains only types, traits and pure logic - no network
//! access, no async runtime, no filesystem. Persistence is reached through
//! the [`sync::KeyValueStorage`] port, which the storefront implements on top
//! of a file and tests implement in memory.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, statuses, orders, reviews and the catalog
//! - [`sync`] - Storage port and the local order status reconciliation pass

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod sync;
pub mod types;

pub use types::*;
