//! Order API handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::core::AppState;
use crate::db::models::Order;
use crate::services::PlaceOrder;
use crate::utils::{AppResponse, AppResult, ok, ok_with_message};

/// POST /api/v1/orders
pub async fn place(
    State(state): State<AppState>,
    Json(req): Json<PlaceOrder>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state.fulfillment.place(req).await?;
    Ok(ok_with_message(order, "Order placed"))
}

/// GET /api/v1/orders/my/{user_id}
pub async fn my_orders(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<AppResponse<Vec<Order>>>> {
    Ok(ok(state.fulfillment.my_orders(&user_id).await?))
}

/// GET /api/v1/orders/admin
pub async fn all_orders(
    State(state): State<AppState>,
) -> AppResult<Json<AppResponse<Vec<Order>>>> {
    Ok(ok(state.fulfillment.all_orders().await?))
}

/// GET /api/v1/orders/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Order>>> {
    Ok(ok(state.fulfillment.get(&id).await?))
}

/// POST /api/v1/orders/{id}/process - advance processing status
pub async fn process(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Order>>> {
    Ok(ok(state.fulfillment.process(&id).await?))
}

/// DELETE /api/v1/orders/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<()>>> {
    state.fulfillment.delete(&id).await?;
    Ok(ok_with_message((), "Order deleted"))
}
