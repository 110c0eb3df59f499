//! In-memory review store for tests and local development.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use uuid::Uuid;

use ezcentials_core::{ProductId, Review, ReviewId, ValidReview};

use super::{NewReview, ReviewStore, ReviewStoreError};

/// Review store kept in process memory. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryReviewStore {
    reviews: RwLock<HashMap<ProductId, Vec<Review>>>,
}

impl MemoryReviewStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReviewStore for MemoryReviewStore {
    async fn list(&self, product_id: &ProductId) -> Result<Vec<Review>, ReviewStoreError> {
        let reviews = self.reviews.read().unwrap_or_else(PoisonError::into_inner);
        Ok(reviews.get(product_id).cloned().unwrap_or_default())
    }

    async fn get(
        &self,
        product_id: &ProductId,
        review_id: &ReviewId,
    ) -> Result<Option<Review>, ReviewStoreError> {
        let reviews = self.reviews.read().unwrap_or_else(PoisonError::into_inner);
        Ok(reviews
            .get(product_id)
            .and_then(|list| list.iter().find(|r| &r.id == review_id))
            .cloned())
    }

    async fn create(&self, review: NewReview) -> Result<Review, ReviewStoreError> {
        let review = review.into_review(ReviewId::new(Uuid::new_v4().simple().to_string()));
        self.reviews
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(review.product_id.clone())
            .or_default()
            .push(review.clone());
        Ok(review)
    }

    async fn update(
        &self,
        product_id: &ProductId,
        review_id: &ReviewId,
        edit: ValidReview,
    ) -> Result<Review, ReviewStoreError> {
        let mut reviews = self.reviews.write().unwrap_or_else(PoisonError::into_inner);
        let review = reviews
            .get_mut(product_id)
            .and_then(|list| list.iter_mut().find(|r| &r.id == review_id))
            .ok_or_else(|| ReviewStoreError::NotFound(review_id.clone()))?;

        review.rating = edit.rating;
        review.comment_de.clone_from(&edit.comment);
        review.comment_fr.clone_from(&edit.comment);
        review.comment_en.clone_from(&edit.comment);
        review.comment = edit.comment;
        Ok(review.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;
    use ezcentials_core::{Rating, UserId};

    fn new_review(product: &str) -> NewReview {
        NewReview {
            product_id: ProductId::new(product),
            user_id: UserId::new("u-1"),
            user_name: "Léa".to_string(),
            rating: Rating::new(5).unwrap(),
            comment: "Riecht fantastisch".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_reviews_are_scoped_per_product() {
        let store = MemoryReviewStore::new();
        let a = store.create(new_review("p-1")).await.unwrap();
        store.create(new_review("p-2")).await.unwrap();

        let listed = store.list(&ProductId::new("p-1")).await.unwrap();
        assert_eq!(listed, vec![a.clone()]);
        assert!(
            store
                .get(&ProductId::new("p-2"), &a.id)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_update_missing_review() {
        let store = MemoryReviewStore::new();
        let edit = ValidReview {
            rating: Rating::new(1).unwrap(),
            comment: "Gar nicht gut".to_string(),
        };
        let err = store
            .update(&ProductId::new("p-1"), &ReviewId::new("r-1"), edit)
            .await
            .unwrap_err();
        assert!(matches!(err, ReviewStoreError::NotFound(_)));
    }
}
