//! Settlement ledger API handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::core::AppState;
use crate::db::models::{PaymentStatus, SettlementEntry};
use crate::utils::{AppError, AppResponse, AppResult, ok, ok_with_message};

#[derive(Deserialize)]
pub struct StatusFilter {
    pub status: Option<String>,
}

fn parse_status(raw: &str) -> AppResult<PaymentStatus> {
    match raw {
        "pending" => Ok(PaymentStatus::Pending),
        "completed" => Ok(PaymentStatus::Completed),
        other => Err(AppError::Validation(format!("Unknown payment status: {other}"))),
    }
}

/// GET /api/v1/settlements/seller/{user_id}?status=pending
pub async fn list_by_seller(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(filter): Query<StatusFilter>,
) -> AppResult<Json<AppResponse<Vec<SettlementEntry>>>> {
    let status = filter.status.as_deref().map(parse_status).transpose()?;
    Ok(ok(state.settlement.list_by_seller(&user_id, status).await?))
}

/// GET /api/v1/settlements/pending - admin payout worklist
pub async fn list_pending(
    State(state): State<AppState>,
) -> AppResult<Json<AppResponse<Vec<SettlementEntry>>>> {
    Ok(ok(state.settlement.list_pending().await?))
}

/// GET /api/v1/settlements/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<SettlementEntry>>> {
    Ok(ok(state.settlement.get(&id).await?))
}

/// POST /api/v1/settlements/{id}/complete - flag as paid out
pub async fn complete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<SettlementEntry>>> {
    let entry = state.settlement.mark_completed(&id).await?;
    Ok(ok_with_message(entry, "Settlement completed"))
}
