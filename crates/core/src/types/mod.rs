//! Core types for EZCENTIALS.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod catalog;
pub mod id;
pub mod order;
pub mod price;
pub mod review;
pub mod status;

pub use catalog::{
    ALL_PRODUCTS_SLUG, Catalog, CatalogError, Category, CategoryPage, Language, Product,
};
pub use id::*;
pub use order::{LocalOrder, StatusChange};
pub use price::{CurrencyCode, Price};
pub use review::{
    ANONYMOUS_USER_NAME, FieldError, MIN_COMMENT_CHARS, Rating, Review, ReviewDraft,
    ReviewValidationError, ValidReview,
};
pub use status::*;
