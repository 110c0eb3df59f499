//! Integration tests for the EZCENTIALS storefront.
//!
//! The tests drive the full router in process with `tower::ServiceExt::oneshot`,
//! backed by the bundled catalog, an in-memory review store and in-memory
//! order storage. No network or database is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p ezcentials-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `catalog` - Category and "all products" listings
//! - `reviews` - Review listing, creation and editing
//! - `orders` - Order placement, payment decisions and status sync

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use ezcentials_core::sync::MemoryStorage;
use ezcentials_storefront::catalog::load_catalog;
use ezcentials_storefront::config::StorefrontConfig;
use ezcentials_storefront::middleware::{USER_ID_HEADER, USER_NAME_HEADER};
use ezcentials_storefront::reviews::MemoryReviewStore;
use ezcentials_storefront::routes;
use ezcentials_storefront::state::AppState;

/// Response body limit for test requests.
const BODY_LIMIT: usize = 1024 * 1024;

/// A storefront wired to in-memory stores.
pub struct TestContext {
    pub state: AppState,
    pub orders: Arc<MemoryStorage>,
}

/// A signed-in user, forwarded the way the identity provider does it.
#[derive(Debug, Clone, Copy)]
pub struct TestUser<'a> {
    pub id: &'a str,
    pub name: Option<&'a str>,
}

impl TestContext {
    /// Build a storefront over the bundled catalog.
    ///
    /// # Panics
    ///
    /// Panics if the bundled catalog cannot be loaded.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        let catalog_path =
            PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../storefront/content/catalog.json");
        let catalog = load_catalog(&catalog_path).expect("bundled catalog should load");
        let orders = Arc::new(MemoryStorage::new());
        let config = StorefrontConfig {
            catalog_path,
            ..StorefrontConfig::default()
        };
        let state = AppState::new(
            config,
            catalog,
            Arc::new(MemoryReviewStore::new()),
            orders.clone(),
        );
        Self { state, orders }
    }

    /// The full application router.
    #[must_use]
    pub fn app(&self) -> Router {
        routes::app(self.state.clone())
    }

    /// Send a request and return the status and decoded JSON body.
    ///
    /// Empty bodies decode to `Value::Null`, non-JSON bodies to a string.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    #[allow(clippy::expect_used)]
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        user: Option<TestUser<'_>>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(USER_ID_HEADER, user.id);
            if let Some(name) = user.name {
                builder = builder.header(USER_NAME_HEADER, name);
            }
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request should build");

        let response = self
            .app()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), BODY_LIMIT)
            .await
            .expect("body should be readable");

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, json)
    }

    /// `GET` without a user.
    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None, None).await
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
