//! EZCENTIALS storefront library.
//!
//! This crate provides the storefront functionality as a library,
//! allowing it to be tested and reused by the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod error;
pub mod firestore;
pub mod middleware;
pub mod models;
pub mod reviews;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;
