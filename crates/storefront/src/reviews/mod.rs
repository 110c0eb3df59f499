//! Product reviews.
//!
//! Reviews live in the `products/{productId}/reviews` collection. The
//! [`ReviewStore`] trait hides where that collection is kept: Firestore in
//! production, memory for tests and local development. The functions in
//! this module apply the form rules (sign-in, validation, authorship) on
//! top of any store.

mod firestore;
mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, instrument};

use ezcentials_core::{
    Catalog, ProductId, Rating, Review, ReviewDraft, ReviewId, ReviewValidationError, UserId,
    ValidReview,
};

use crate::firestore::FirestoreError;
use crate::models::CurrentUser;

pub use firestore::FirestoreReviewStore;
pub use memory::MemoryReviewStore;

/// Message shown when an anonymous visitor submits a review.
pub const SIGN_IN_REQUIRED: &str = "You must be logged in to leave a review.";

/// Errors from a review store backend.
#[derive(Debug, Error)]
pub enum ReviewStoreError {
    /// The review does not exist.
    #[error("review not found: {0}")]
    NotFound(ReviewId),

    /// A stored document could not be read as a review.
    #[error("corrupt review {id}: {reason}")]
    Corrupt { id: String, reason: String },

    /// Firestore request failed.
    #[error(transparent)]
    Firestore(#[from] FirestoreError),
}

/// Errors from the review operations.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("You must be logged in to leave a review.")]
    NotSignedIn,

    #[error(transparent)]
    Invalid(#[from] ReviewValidationError),

    #[error("unknown product: {0}")]
    UnknownProduct(ProductId),

    #[error("review not found: {0}")]
    NotFound(ReviewId),

    /// Only the author may edit a review.
    #[error("review {0} belongs to another user")]
    NotAuthor(ReviewId),

    #[error(transparent)]
    Store(ReviewStoreError),
}

impl From<ReviewStoreError> for ReviewError {
    fn from(err: ReviewStoreError) -> Self {
        match err {
            ReviewStoreError::NotFound(id) => Self::NotFound(id),
            other => Self::Store(other),
        }
    }
}

/// A review about to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    pub product_id: ProductId,
    pub user_id: UserId,
    pub user_name: String,
    pub rating: Rating,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl NewReview {
    /// The stored review, with every translation set to the original comment.
    #[must_use]
    pub fn into_review(self, id: ReviewId) -> Review {
        Review {
            id,
            product_id: self.product_id,
            user_id: self.user_id,
            user_name: self.user_name,
            rating: self.rating,
            comment_de: self.comment.clone(),
            comment_fr: self.comment.clone(),
            comment_en: self.comment.clone(),
            comment: self.comment,
            created_at: Some(self.created_at),
        }
    }
}

/// Storage for product reviews.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Every review of a product, in no particular order.
    async fn list(&self, product_id: &ProductId) -> Result<Vec<Review>, ReviewStoreError>;

    async fn get(
        &self,
        product_id: &ProductId,
        review_id: &ReviewId,
    ) -> Result<Option<Review>, ReviewStoreError>;

    /// Store a new review under a fresh id.
    async fn create(&self, review: NewReview) -> Result<Review, ReviewStoreError>;

    /// Replace the rating and comment (with its translations) of a review.
    async fn update(
        &self,
        product_id: &ProductId,
        review_id: &ReviewId,
        edit: ValidReview,
    ) -> Result<Review, ReviewStoreError>;
}

/// Reviews of a product, newest first.
///
/// # Errors
///
/// Returns `ReviewError::Store` if the store cannot be read.
#[instrument(skip(store))]
pub async fn list_reviews(
    store: &dyn ReviewStore,
    product_id: &ProductId,
) -> Result<Vec<Review>, ReviewError> {
    let mut reviews = store.list(product_id).await?;
    // Reviews without a timestamp sort last.
    reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(reviews)
}

/// Add a review for a catalog product on behalf of the signed-in user.
///
/// # Errors
///
/// - `ReviewError::NotSignedIn` without a user
/// - `ReviewError::Invalid` if the draft fails validation
/// - `ReviewError::UnknownProduct` if the product is not in the catalog
/// - `ReviewError::Store` if the store rejects the write
#[instrument(skip(store, catalog, draft), fields(user_id))]
pub async fn add_review(
    store: &dyn ReviewStore,
    catalog: &Catalog,
    user: Option<&CurrentUser>,
    product_id: &ProductId,
    draft: &ReviewDraft,
) -> Result<Review, ReviewError> {
    let user = user.ok_or(ReviewError::NotSignedIn)?;
    tracing::Span::current().record("user_id", user.id.as_str());

    let valid = draft.validate()?;
    if catalog.product(product_id).is_none() {
        return Err(ReviewError::UnknownProduct(product_id.clone()));
    }

    let review = store
        .create(NewReview {
            product_id: product_id.clone(),
            user_id: user.id.clone(),
            user_name: user.review_name().to_string(),
            rating: valid.rating,
            comment: valid.comment,
            created_at: Utc::now(),
        })
        .await?;

    info!(review_id = %review.id, rating = review.rating.stars(), "Review added");
    Ok(review)
}

/// Edit one of the signed-in user's own reviews.
///
/// # Errors
///
/// - `ReviewError::NotSignedIn` without a user
/// - `ReviewError::Invalid` if the draft fails validation
/// - `ReviewError::NotFound` if the review does not exist
/// - `ReviewError::NotAuthor` if someone else wrote it
/// - `ReviewError::Store` if the store rejects the write
#[instrument(skip(store, draft), fields(user_id))]
pub async fn edit_review(
    store: &dyn ReviewStore,
    user: Option<&CurrentUser>,
    product_id: &ProductId,
    review_id: &ReviewId,
    draft: &ReviewDraft,
) -> Result<Review, ReviewError> {
    let user = user.ok_or(ReviewError::NotSignedIn)?;
    tracing::Span::current().record("user_id", user.id.as_str());

    let valid = draft.validate()?;
    let existing = store
        .get(product_id, review_id)
        .await?
        .ok_or_else(|| ReviewError::NotFound(review_id.clone()))?;
    if existing.user_id != user.id {
        return Err(ReviewError::NotAuthor(review_id.clone()));
    }

    let review = store.update(product_id, review_id, valid).await?;
    info!(review_id = %review.id, rating = review.rating.stars(), "Review updated");
    Ok(review)
}
