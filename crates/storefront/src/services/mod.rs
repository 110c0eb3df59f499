//! Background services for storefront.
//!
//! # Services
//!
//! - `order_store` - Serialized read-modify-write access to the order slots
//! - `order_sync` - Local order status reconciliation driver

pub mod order_store;
pub mod order_sync;
