//! CLI command implementations.
//!
//! Commands return the lines to print so they can be tested without
//! capturing stdout.

pub mod catalog;
pub mod orders;
