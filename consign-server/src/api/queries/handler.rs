//! Intake query API handlers

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
};
use serde::Deserialize;

use crate::api::upload::PhotoForm;
use crate::core::AppState;
use crate::db::models::{IntakeQuery, PickupDetails, QueryStatus};
use crate::services::{ProductDraft, SubmitQuery};
use crate::utils::{AppError, AppResponse, AppResult, ok, ok_with_message};

fn parse_status(raw: &str) -> AppResult<QueryStatus> {
    match raw {
        "pending" => Ok(QueryStatus::Pending),
        "approved" => Ok(QueryStatus::Approved),
        "success" => Ok(QueryStatus::Success),
        other => Err(AppError::Validation(format!("Unknown status: {other}"))),
    }
}

/// POST /api/v1/queries
///
/// Multipart form: `owner_user_id`, `owner_email`, `product_details`
/// (JSON), `pickup_details` (JSON) and 1-5 `photos` files.
pub async fn submit(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<AppResponse<IntakeQuery>>> {
    let form = PhotoForm::parse(multipart).await?;
    let req = SubmitQuery {
        owner_user_id: form.text("owner_user_id")?.to_string(),
        owner_email: form.text("owner_email")?.to_string(),
        product: form.json::<ProductDraft>("product_details")?,
        pickup: form.json::<PickupDetails>("pickup_details")?,
    };
    let created = state.intake.submit(req, form.photos).await?;
    Ok(ok_with_message(created, "Query submitted"))
}

/// GET /api/v1/queries/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<IntakeQuery>>> {
    Ok(ok(state.intake.get(&id).await?))
}

/// GET /api/v1/queries/user/{user_id}
pub async fn list_by_owner(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<AppResponse<Vec<IntakeQuery>>>> {
    Ok(ok(state.intake.list_by_owner(&user_id).await?))
}

/// GET /api/v1/queries/status/{status}
pub async fn list_by_status(
    State(state): State<AppState>,
    Path(status): Path<String>,
) -> AppResult<Json<AppResponse<Vec<IntakeQuery>>>> {
    let status = parse_status(&status)?;
    Ok(ok(state.intake.list_by_status(status).await?))
}

/// PUT /api/v1/queries/{id}
///
/// Owner edit while pending. Multipart form: `owner_user_id`,
/// optional `product_details` / `pickup_details` JSON patches and an
/// optional replacement `photos` set.
pub async fn edit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> AppResult<Json<AppResponse<IntakeQuery>>> {
    let form = PhotoForm::parse(multipart).await?;
    let owner = form.text("owner_user_id")?.to_string();
    let product_patch = form.json_or_default("product_details")?;
    let pickup_patch = form.json_or_default("pickup_details")?;
    let updated = state
        .intake
        .edit_by_owner(&id, &owner, product_patch, pickup_patch, form.photos)
        .await?;
    Ok(ok_with_message(updated, "Query updated"))
}

#[derive(Deserialize)]
pub struct OwnerParam {
    pub user_id: String,
}

/// DELETE /api/v1/queries/{id}?user_id=...
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(owner): Query<OwnerParam>,
) -> AppResult<Json<AppResponse<()>>> {
    state.intake.delete_by_owner(&id, &owner.user_id).await?;
    Ok(ok_with_message((), "Query deleted"))
}

/// POST /api/v1/queries/{id}/advance - admin approval step
pub async fn advance(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<IntakeQuery>>> {
    Ok(ok(state.intake.advance(&id).await?))
}

/// POST /api/v1/queries/{id}/reject - admin rejection
pub async fn reject(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<()>>> {
    state.intake.reject(&id).await?;
    Ok(ok_with_message((), "Query rejected"))
}
