//! Integration tests for the local order cache and status sync.

#![allow(clippy::indexing_slicing, clippy::unwrap_used)]

use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use ezcentials_core::sync::{KeyValueStorage, STATUS_UPDATES_KEY, load_status_updates};
use ezcentials_core::{OrderId, StatusChange, TerminalStatus};
use ezcentials_integration_tests::TestContext;
use serde_json::json;
use tower::ServiceExt;

async fn place(ctx: &TestContext, id: &str) -> StatusCode {
    let (status, _) = ctx
        .request(
            Method::POST,
            "/orders",
            None,
            Some(json!({"id": id, "total": "29.90"})),
        )
        .await;
    status
}

async fn decide(ctx: &TestContext, id: &str, status: &str) -> StatusCode {
    let (code, _) = ctx
        .request(
            Method::POST,
            &format!("/orders/{id}/status"),
            None,
            Some(json!({ "status": status })),
        )
        .await;
    code
}

#[tokio::test]
async fn test_place_order_starts_pending() {
    let ctx = TestContext::new();
    let (status, order) = ctx
        .request(
            Method::POST,
            "/orders",
            None,
            Some(json!({"id": "ORD-1", "total": "29.90", "paymentStatus": "completed"})),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["paymentStatus"], "pending");
    assert_eq!(order["total"], "29.90");

    let (status, orders) = ctx.get("/orders").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders, json!([order]));
}

#[tokio::test]
async fn test_place_duplicate_order() {
    let ctx = TestContext::new();
    assert_eq!(place(&ctx, "ORD-1").await, StatusCode::CREATED);
    assert_eq!(place(&ctx, "ORD-1").await, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_decision_waits_for_sync() {
    let ctx = TestContext::new();
    place(&ctx, "ORD-1").await;

    assert_eq!(decide(&ctx, "ORD-1", "rejected").await, StatusCode::ACCEPTED);

    let (_, orders) = ctx.get("/orders").await;
    assert_eq!(orders[0]["paymentStatus"], "pending");
    let pending = load_status_updates(ctx.orders.as_ref()).unwrap();
    assert_eq!(pending.get("ORD-1"), Some(TerminalStatus::Rejected));
}

#[tokio::test]
async fn test_non_terminal_decision_rejected() {
    let ctx = TestContext::new();
    place(&ctx, "ORD-1").await;
    assert_eq!(
        decide(&ctx, "ORD-1", "processing").await,
        StatusCode::UNPROCESSABLE_ENTITY
    );
    assert!(ctx.orders.get(STATUS_UPDATES_KEY).is_none());
}

#[tokio::test]
async fn test_sync_request_applies_decisions() {
    let ctx = TestContext::new();
    let handle = ctx.state.start_order_sync();
    assert!(handle.is_running());

    place(&ctx, "ORD-1").await;
    place(&ctx, "ORD-2").await;
    decide(&ctx, "ORD-2", "completed").await;
    decide(&ctx, "ORD-404", "rejected").await;

    let mut events = ctx.state.subscribe_status_updates();
    let (status, _) = ctx.request(Method::POST, "/orders/sync", None, None).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let change = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        change,
        StatusChange {
            order_id: OrderId::new("ORD-2"),
            new_status: TerminalStatus::Completed,
        }
    );

    let (_, orders) = ctx.get("/orders").await;
    assert_eq!(orders[0]["paymentStatus"], "pending");
    assert_eq!(orders[1]["paymentStatus"], "completed");
    assert!(load_status_updates(ctx.orders.as_ref()).unwrap().is_empty());

    handle.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_orders_placed_while_syncing_are_kept() {
    const ORDERS: usize = 200;

    let ctx = TestContext::new();
    place(&ctx, "seed").await;
    let handle = ctx.state.start_order_sync();

    let decisions = {
        let state = ctx.state.clone();
        tokio::spawn(async move {
            for _ in 0..ORDERS {
                state
                    .orders()
                    .record_status(OrderId::new("seed"), TerminalStatus::Completed)
                    .unwrap();
                state.request_order_sync();
                tokio::task::yield_now().await;
            }
        })
    };

    let placements: Vec<_> = (0..ORDERS)
        .map(|i| {
            let app = ctx.app();
            tokio::spawn(async move {
                let request = Request::builder()
                    .method(Method::POST)
                    .uri("/orders")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({ "id": format!("ORD-{i}") }).to_string()))
                    .unwrap();
                app.oneshot(request).await.unwrap().status()
            })
        })
        .collect();
    for placement in placements {
        assert_eq!(placement.await.unwrap(), StatusCode::CREATED);
    }
    decisions.await.unwrap();
    handle.stop().await;

    let (_, orders) = ctx.get("/orders").await;
    assert_eq!(orders.as_array().map(Vec::len), Some(ORDERS + 1));
}

#[tokio::test]
async fn test_pending_decisions_applied_on_start() {
    let ctx = TestContext::new();
    place(&ctx, "ORD-1").await;
    decide(&ctx, "ORD-1", "completed").await;

    let handle = ctx.state.start_order_sync();

    let (_, orders) = ctx.get("/orders").await;
    assert_eq!(orders[0]["paymentStatus"], "completed");
    handle.stop().await;
}

#[tokio::test]
async fn test_events_stream_headers() {
    let ctx = TestContext::new();
    let response = ctx
        .app()
        .oneshot(
            Request::builder()
                .uri("/orders/events")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );
}
