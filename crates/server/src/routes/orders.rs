//! Order routes: checkout and lifecycle.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
};
use serde::{Deserialize, Serialize};

use tavola_core::{OrderId, OrderStatus, PaymentStatus, RestaurantId};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::Order;
use crate::routes::{ApiResponse, success};
use crate::services::orders::{CheckoutInput, OrderService};
use crate::services::payment::PaymentIntent;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list).post(checkout))
        .route("/orders/restaurant/{id}", get(list_for_restaurant))
        .route("/orders/{id}", get(get_one))
        .route("/orders/{id}/status", put(update_status))
        .route("/orders/{id}/cancel", put(cancel))
        .route("/orders/{id}/payment", put(confirm_payment))
}

/// Checkout response: the order plus, for card and PayPal payments, the
/// payment intent the client completes.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutResponse {
    order: Order,
    #[serde(skip_serializing_if = "Option::is_none")]
    payment_intent: Option<PaymentIntent>,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    status: Option<OrderStatus>,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: OrderStatus,
}

async fn checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<CheckoutInput>,
) -> Result<(StatusCode, Json<ApiResponse<CheckoutResponse>>)> {
    let placed = OrderService::new(state.pool()).checkout(&user, input).await?;
    Ok((
        StatusCode::CREATED,
        success(CheckoutResponse {
            order: placed.order,
            payment_intent: placed.payment_intent,
        }),
    ))
}

async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<Order>>>> {
    let orders = OrderService::new(state.pool())
        .list_for_user(&user, query.status)
        .await?;
    Ok(success(orders))
}

async fn list_for_restaurant(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<RestaurantId>,
) -> Result<Json<ApiResponse<Vec<Order>>>> {
    let orders = OrderService::new(state.pool())
        .list_for_restaurant(&user, id)
        .await?;
    Ok(success(orders))
}

async fn get_one(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<ApiResponse<Order>>> {
    let order = OrderService::new(state.pool()).get(&user, id).await?;
    Ok(success(order))
}

async fn update_status(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
    Json(body): Json<StatusBody>,
) -> Result<Json<ApiResponse<Order>>> {
    let order = OrderService::new(state.pool())
        .update_status(&user, id, body.status)
        .await?;
    Ok(success(order))
}

#[derive(Debug, Deserialize)]
struct PaymentBody {
    status: PaymentStatus,
}

/// Record the outcome of the mock payment flow.
async fn confirm_payment(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
    Json(body): Json<PaymentBody>,
) -> Result<Json<ApiResponse<Order>>> {
    let order = OrderService::new(state.pool())
        .confirm_payment(&user, id, body.status)
        .await?;
    Ok(success(order))
}

async fn cancel(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<ApiResponse<Order>>> {
    let order = OrderService::new(state.pool()).cancel(&user, id).await?;
    Ok(success(order))
}
