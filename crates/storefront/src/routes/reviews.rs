//! Product review route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

use ezcentials_core::{Language, ProductId, Rating, Review, ReviewDraft, ReviewId, UserId};

use super::products::LanguageQuery;
use crate::error::Result;
use crate::middleware::OptionalUser;
use crate::reviews;
use crate::state::AppState;

/// Review display data with the comment in the requested language.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewView {
    pub id: ReviewId,
    pub user_id: UserId,
    pub user_name: String,
    pub rating: Rating,
    pub comment: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl ReviewView {
    fn new(review: &Review, language: Language) -> Self {
        Self {
            id: review.id.clone(),
            user_id: review.user_id.clone(),
            user_name: review.user_name.clone(),
            rating: review.rating,
            comment: review.comment_for(language).to_string(),
            created_at: review.created_at,
        }
    }
}

/// GET /products/{id}/reviews
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    Query(query): Query<LanguageQuery>,
) -> Result<Json<Vec<ReviewView>>> {
    let language = query.language();
    let reviews = reviews::list_reviews(state.reviews(), &product_id).await?;
    Ok(Json(
        reviews
            .iter()
            .map(|r| ReviewView::new(r, language))
            .collect(),
    ))
}

/// POST /products/{id}/reviews
#[instrument(skip(state, user, draft))]
pub async fn create(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Path(product_id): Path<ProductId>,
    Json(draft): Json<ReviewDraft>,
) -> Result<(StatusCode, Json<Review>)> {
    let review = reviews::add_review(
        state.reviews(),
        state.catalog(),
        user.as_ref(),
        &product_id,
        &draft,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// PUT /products/{id}/reviews/{review}
#[instrument(skip(state, user, draft))]
pub async fn update(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Path((product_id, review_id)): Path<(ProductId, ReviewId)>,
    Json(draft): Json<ReviewDraft>,
) -> Result<Json<Review>> {
    let review = reviews::edit_review(
        state.reviews(),
        user.as_ref(),
        &product_id,
        &review_id,
        &draft,
    )
    .await?;
    Ok(Json(review))
}
