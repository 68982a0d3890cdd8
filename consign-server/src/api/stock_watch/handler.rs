//! Back-in-stock subscription API handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use crate::core::AppState;
use crate::db::models::StockWatch;
use crate::utils::{AppResponse, AppResult, ok, ok_with_message};

#[derive(Deserialize)]
pub struct WatchBody {
    pub email: String,
    pub product_id: String,
}

/// POST /api/v1/stock-watch
pub async fn subscribe(
    State(state): State<AppState>,
    Json(body): Json<WatchBody>,
) -> AppResult<Json<AppResponse<StockWatch>>> {
    let watch = state
        .stock_watch
        .subscribe(&body.email, &body.product_id)
        .await?;
    Ok(ok_with_message(
        watch,
        "Out of stock. We will notify you when it is back.",
    ))
}

/// DELETE /api/v1/stock-watch
pub async fn unsubscribe(
    State(state): State<AppState>,
    Json(body): Json<WatchBody>,
) -> AppResult<Json<AppResponse<()>>> {
    state
        .stock_watch
        .unsubscribe(&body.email, &body.product_id)
        .await?;
    Ok(ok_with_message((), "Subscription removed"))
}

/// GET /api/v1/stock-watch/admin
pub async fn list_all(
    State(state): State<AppState>,
) -> AppResult<Json<AppResponse<Vec<StockWatch>>>> {
    Ok(ok(state.stock_watch.list_all().await?))
}

#[derive(Serialize)]
pub struct NotifyResult {
    pub notified: usize,
}

/// POST /api/v1/stock-watch/notify/{product_id}
///
/// Admin trigger after a restock: emails every watcher and clears
/// their subscriptions.
pub async fn notify(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> AppResult<Json<AppResponse<NotifyResult>>> {
    let notified = state.stock_watch.notify_back_in_stock(&product_id).await?;
    Ok(ok(NotifyResult { notified }))
}
