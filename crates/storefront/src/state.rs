//! Application state shared across handlers.

use std::sync::Arc;

use tokio::sync::{Notify, broadcast};

use ezcentials_core::sync::KeyValueStorage;
use ezcentials_core::{Catalog, StatusChange};

use crate::catalog::{CatalogLoadError, load_catalog};
use crate::config::StorefrontConfig;
use crate::firestore::{FirestoreClient, FirestoreError};
use crate::reviews::{FirestoreReviewStore, MemoryReviewStore, ReviewStore};
use crate::services::order_store::OrderStore;
use crate::services::order_sync::{OrderStatusSyncer, SyncHandle};
use crate::storage::{FileStorage, StorageError};

/// Buffered status updates per live subscriber before it starts lagging.
const STATUS_EVENT_CAPACITY: usize = 64;

/// Error building application state from configuration.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogLoadError),
    #[error("order storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("firestore error: {0}")]
    Firestore(#[from] FirestoreError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// catalog, the review store and the origin's order storage.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: Catalog,
    reviews: Arc<dyn ReviewStore>,
    orders: OrderStore,
    focus: Arc<Notify>,
    status_events: broadcast::Sender<StatusChange>,
}

impl AppState {
    /// Create application state from already-built parts.
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        catalog: Catalog,
        reviews: Arc<dyn ReviewStore>,
        orders: Arc<dyn KeyValueStorage>,
    ) -> Self {
        let (status_events, _) = broadcast::channel(STATUS_EVENT_CAPACITY);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                reviews,
                orders: OrderStore::new(orders),
                focus: Arc::new(Notify::new()),
                status_events,
            }),
        }
    }

    /// Build application state as configured.
    ///
    /// Reviews go to Firestore when a project is configured and stay in
    /// memory otherwise.
    ///
    /// # Errors
    ///
    /// Returns `StateError` if the catalog cannot be loaded, the order
    /// storage cannot be opened or the Firestore client cannot be created.
    pub fn from_config(config: StorefrontConfig) -> Result<Self, StateError> {
        let catalog = load_catalog(&config.catalog_path)?;
        let orders = FileStorage::for_origin(
            &config.storage_dir,
            &config.origin,
            config.storage_quota_bytes,
        )?;
        tracing::info!(path = %orders.path().display(), "Order storage opened");

        let reviews: Arc<dyn ReviewStore> = match &config.firebase {
            Some(firebase) => {
                tracing::info!(project = %firebase.project_id, "Reviews stored in Firestore");
                Arc::new(FirestoreReviewStore::new(FirestoreClient::new(firebase)?))
            }
            None => {
                tracing::warn!("FIREBASE_PROJECT_ID not set, reviews are kept in memory");
                Arc::new(MemoryReviewStore::new())
            }
        };

        Ok(Self::new(config, catalog, reviews, Arc::new(orders)))
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Get a reference to the review store.
    #[must_use]
    pub fn reviews(&self) -> &dyn ReviewStore {
        self.inner.reviews.as_ref()
    }

    /// The order slots, locked for every read-modify-write.
    #[must_use]
    pub fn orders(&self) -> &OrderStore {
        &self.inner.orders
    }

    /// A syncer wired to this state's storage, focus signal and event channel.
    #[must_use]
    pub fn order_syncer(&self) -> OrderStatusSyncer {
        OrderStatusSyncer::new(
            self.inner.orders.clone(),
            self.inner.status_events.clone(),
            self.inner.focus.clone(),
            self.inner.config.sync_interval,
        )
    }

    /// Run the initial order status pass and start the background triggers.
    #[must_use]
    pub fn start_order_sync(&self) -> SyncHandle {
        self.order_syncer().start()
    }

    /// Signal the running syncer, as if the window regained focus.
    pub fn request_order_sync(&self) {
        self.inner.focus.notify_one();
    }

    /// Receive every status change applied from now on.
    #[must_use]
    pub fn subscribe_status_updates(&self) -> broadcast::Receiver<StatusChange> {
        self.inner.status_events.subscribe()
    }
}
