//! Review store backed by Firestore.
//!
//! Document layout (`products/{productId}/reviews/{reviewId}`):
//!
//! | field        | type      |
//! |--------------|-----------|
//! | `userId`     | string    |
//! | `userName`   | string    |
//! | `rating`     | integer   |
//! | `comment`    | string    |
//! | `comment_de` | string    |
//! | `comment_fr` | string    |
//! | `comment_en` | string    |
//! | `createdAt`  | timestamp |

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::warn;

use ezcentials_core::{ProductId, Rating, Review, ReviewId, UserId, ValidReview};

use super::{NewReview, ReviewStore, ReviewStoreError};
use crate::firestore::FirestoreClient;
use crate::firestore::types::{Document, integer_value, string_value, timestamp_value};

const PRODUCTS: &str = "products";
const REVIEWS: &str = "reviews";

/// Review store using the Firestore REST API.
#[derive(Clone)]
pub struct FirestoreReviewStore {
    client: FirestoreClient,
}

impl FirestoreReviewStore {
    #[must_use]
    pub const fn new(client: FirestoreClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReviewStore for FirestoreReviewStore {
    async fn list(&self, product_id: &ProductId) -> Result<Vec<Review>, ReviewStoreError> {
        let documents = self
            .client
            .list_documents(&[PRODUCTS, product_id.as_str(), REVIEWS])
            .await?;

        Ok(documents
            .iter()
            .filter_map(|doc| match review_from_document(product_id, doc) {
                Ok(review) => Some(review),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable review document");
                    None
                }
            })
            .collect())
    }

    async fn get(
        &self,
        product_id: &ProductId,
        review_id: &ReviewId,
    ) -> Result<Option<Review>, ReviewStoreError> {
        self.client
            .get_document(&[PRODUCTS, product_id.as_str(), REVIEWS, review_id.as_str()])
            .await?
            .map(|doc| review_from_document(product_id, &doc))
            .transpose()
    }

    async fn create(&self, review: NewReview) -> Result<Review, ReviewStoreError> {
        let mut fields = Map::new();
        fields.insert("userId".to_string(), string_value(review.user_id.as_str()));
        fields.insert("userName".to_string(), string_value(&review.user_name));
        // The REST create call cannot set a server timestamp, so the
        // storefront clock stands in; reads fall back to `createTime`.
        fields.insert("createdAt".to_string(), timestamp_value(review.created_at));
        fields.extend(content_fields(review.rating, &review.comment));

        let doc = self
            .client
            .create_document(&[PRODUCTS, review.product_id.as_str(), REVIEWS], fields)
            .await?;
        review_from_document(&review.product_id, &doc)
    }

    async fn update(
        &self,
        product_id: &ProductId,
        review_id: &ReviewId,
        edit: ValidReview,
    ) -> Result<Review, ReviewStoreError> {
        let doc = self
            .client
            .update_document(
                &[PRODUCTS, product_id.as_str(), REVIEWS, review_id.as_str()],
                content_fields(edit.rating, &edit.comment),
            )
            .await
            .map_err(|e| match e {
                crate::firestore::FirestoreError::NotFound(_) => {
                    ReviewStoreError::NotFound(review_id.clone())
                }
                other => other.into(),
            })?;
        review_from_document(product_id, &doc)
    }
}

/// Fields written by both the add and the edit form.
fn content_fields(rating: Rating, comment: &str) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("rating".to_string(), integer_value(i64::from(rating.stars())));
    for key in ["comment", "comment_de", "comment_fr", "comment_en"] {
        fields.insert(key.to_string(), string_value(comment));
    }
    fields
}

fn review_from_document(product_id: &ProductId, doc: &Document) -> Result<Review, ReviewStoreError> {
    let corrupt = |reason: &str| ReviewStoreError::Corrupt {
        id: doc.id().to_string(),
        reason: reason.to_string(),
    };

    let user_id = doc.string("userId").ok_or_else(|| corrupt("missing userId"))?;
    let rating = doc
        .integer("rating")
        .and_then(|r| u8::try_from(r).ok())
        .and_then(Rating::new)
        .ok_or_else(|| corrupt("rating missing or out of range"))?;
    let comment = doc.string("comment").unwrap_or_default().to_string();
    let localized = |field: &str| doc.string(field).map_or_else(|| comment.clone(), String::from);

    Ok(Review {
        id: ReviewId::new(doc.id()),
        product_id: product_id.clone(),
        user_id: UserId::new(user_id),
        user_name: doc.string("userName").unwrap_or_default().to_string(),
        rating,
        comment_de: localized("comment_de"),
        comment_fr: localized("comment_fr"),
        comment_en: localized("comment_en"),
        comment,
        // Server timestamp when the client-side one is missing.
        created_at: doc.timestamp("createdAt").or(doc.create_time),
    })
}
