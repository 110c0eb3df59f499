//! Integration tests for product reviews.

#![allow(clippy::indexing_slicing)]

use axum::http::{Method, StatusCode};
use ezcentials_integration_tests::{TestContext, TestUser};
use serde_json::{Value, json};

const ALICE: TestUser<'static> = TestUser {
    id: "user-alice",
    name: Some("Alice"),
};

const BOB: TestUser<'static> = TestUser {
    id: "user-bob",
    name: None,
};

async fn post_review(ctx: &TestContext, user: Option<TestUser<'_>>, body: Value) -> (StatusCode, Value) {
    ctx.request(Method::POST, "/products/ezc-001/reviews", user, Some(body))
        .await
}

#[tokio::test]
async fn test_no_reviews_yet() {
    let ctx = TestContext::new();
    let (status, body) = ctx.get("/products/ezc-001/reviews").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_add_review_requires_sign_in() {
    let ctx = TestContext::new();
    let (status, body) = post_review(
        &ctx,
        None,
        json!({"rating": 5, "comment": "Wunderbares Serum!"}),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "You must be logged in to leave a review.");
}

#[tokio::test]
async fn test_add_review_validation() {
    let ctx = TestContext::new();
    let (status, body) = post_review(&ctx, Some(ALICE), json!({"rating": 0, "comment": "kurz"})).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .map(|errors| errors.iter().filter_map(|e| e["field"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(fields, vec!["rating", "comment"]);

    let (_, listed) = ctx.get("/products/ezc-001/reviews").await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn test_add_review_for_unknown_product() {
    let ctx = TestContext::new();
    let (status, _) = ctx
        .request(
            Method::POST,
            "/products/ezc-999/reviews",
            Some(ALICE),
            Some(json!({"rating": 4, "comment": "Gutes Produkt, gerne wieder"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_add_and_list_reviews() {
    let ctx = TestContext::new();

    let (status, first) = post_review(
        &ctx,
        Some(ALICE),
        json!({"rating": 5, "comment": "Wunderbares Serum!"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["user_name"], "Alice");
    assert_eq!(first["rating"], 5);
    assert_eq!(first["comment_fr"], "Wunderbares Serum!");

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let (status, second) = post_review(
        &ctx,
        Some(BOB),
        json!({"rating": 3, "comment": "Ganz okay, riecht etwas stark."}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(second["user_name"], "Utilisateur Anonyme");

    let (status, listed) = ctx.get("/products/ezc-001/reviews?lang=en").await;
    assert_eq!(status, StatusCode::OK);
    let listed = listed.as_array().cloned().unwrap_or_default();
    assert_eq!(listed.len(), 2);
    // Newest first
    assert_eq!(listed[0]["user_id"], "user-bob");
    assert_eq!(listed[1]["comment"], "Wunderbares Serum!");

    let (_, other) = ctx.get("/products/ezc-002/reviews").await;
    assert_eq!(other, json!([]));
}

#[tokio::test]
async fn test_edit_own_review() {
    let ctx = TestContext::new();
    let (_, created) = post_review(
        &ctx,
        Some(ALICE),
        json!({"rating": 2, "comment": "Leider nicht überzeugt."}),
    )
    .await;
    let id = created["id"].as_str().unwrap_or_default().to_string();

    let (status, edited) = ctx
        .request(
            Method::PUT,
            &format!("/products/ezc-001/reviews/{id}"),
            Some(ALICE),
            Some(json!({"rating": 4, "comment": "Nach zwei Wochen deutlich besser."})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["rating"], 4);
    assert_eq!(edited["comment"], "Nach zwei Wochen deutlich besser.");
    assert_eq!(edited["comment_en"], "Nach zwei Wochen deutlich besser.");
    assert_eq!(edited["user_name"], "Alice");
}

#[tokio::test]
async fn test_edit_review_of_someone_else() {
    let ctx = TestContext::new();
    let (_, created) = post_review(
        &ctx,
        Some(ALICE),
        json!({"rating": 5, "comment": "Wunderbares Serum!"}),
    )
    .await;
    let id = created["id"].as_str().unwrap_or_default().to_string();

    let (status, _) = ctx
        .request(
            Method::PUT,
            &format!("/products/ezc-001/reviews/{id}"),
            Some(BOB),
            Some(json!({"rating": 1, "comment": "Das ist nicht meine Meinung."})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, listed) = ctx.get("/products/ezc-001/reviews").await;
    assert_eq!(listed[0]["rating"], 5);
}

#[tokio::test]
async fn test_edit_missing_review() {
    let ctx = TestContext::new();
    let (status, _) = ctx
        .request(
            Method::PUT,
            "/products/ezc-001/reviews/does-not-exist",
            Some(ALICE),
            Some(json!({"rating": 4, "comment": "Gutes Produkt, gerne wieder"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
