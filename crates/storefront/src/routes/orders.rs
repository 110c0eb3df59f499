//! Local order route handlers.
//!
//! The checkout flow places orders, the confirmation page records payment
//! decisions, and the order status syncer folds those decisions into the
//! cached orders. Clients follow applied changes on the event stream.

use std::convert::Infallible;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, instrument, warn};

use ezcentials_core::{LocalOrder, OrderId, TerminalStatus};

use crate::error::Result;
use crate::state::AppState;

/// Checkout payload. Fields besides `id` are kept on the cached order.
#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub id: OrderId,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payment decision from the confirmation page.
#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: TerminalStatus,
}

/// GET /orders
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<LocalOrder>>> {
    Ok(Json(state.orders().orders()?))
}

/// POST /orders
#[instrument(skip(state, request))]
pub async fn place(
    State(state): State<AppState>,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<LocalOrder>)> {
    let mut order = LocalOrder::new(request.id);
    order.extra = request.extra;
    // The status of a new order is always pending, whatever the client sent.
    order.extra.remove("paymentStatus");

    state.orders().place(order.clone())?;
    info!(order_id = %order.id, "Order placed");
    Ok((StatusCode::CREATED, Json(order)))
}

/// POST /orders/sync
///
/// Focus trigger: asks the running syncer for an immediate pass.
pub async fn sync(State(state): State<AppState>) -> StatusCode {
    state.request_order_sync();
    StatusCode::ACCEPTED
}

/// POST /orders/{id}/status
///
/// Records the decision; the next sync pass applies it.
#[instrument(skip(state, request))]
pub async fn record_status(
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<StatusCode> {
    state.orders().record_status(order_id, request.status)?;
    info!(status = %request.status, "Order status update recorded");
    Ok(StatusCode::ACCEPTED)
}

/// GET /orders/events
///
/// Server-sent `status` events, one per applied status change.
pub async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let mut rx = state.subscribe_status_updates();

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(change) => {
                    let json = serde_json::to_string(&change).unwrap_or_else(|_| {
                        r#"{"error":"Failed to serialize status change"}"#.to_string()
                    });
                    yield Ok(Event::default().event("status").data(json));
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Status event subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
