//! Consignment listing API handlers

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
};
use serde::Deserialize;

use crate::api::upload::PhotoForm;
use crate::core::AppState;
use crate::db::models::Listing;
use crate::db::repository::{ListingSearch, SortOrder};
use crate::services::consignment::SearchPage;
use crate::utils::{AppError, AppResponse, AppResult, ok, ok_with_message};

#[derive(Deserialize)]
pub struct PromoteBody {
    pub commission: f64,
}

/// POST /api/v1/listings/promote/{query_id} - admin promotion
pub async fn promote(
    State(state): State<AppState>,
    Path(query_id): Path<String>,
    Json(body): Json<PromoteBody>,
) -> AppResult<Json<AppResponse<Listing>>> {
    let listing = state.consignment.promote(&query_id, body.commission).await?;
    Ok(ok_with_message(listing, "Query promoted"))
}

/// GET /api/v1/listings/latest
pub async fn latest(
    State(state): State<AppState>,
) -> AppResult<Json<AppResponse<Vec<Listing>>>> {
    Ok(ok(state.consignment.latest().await?))
}

/// GET /api/v1/listings/categories
pub async fn categories(
    State(state): State<AppState>,
) -> AppResult<Json<AppResponse<Vec<String>>>> {
    Ok(ok(state.consignment.categories().await?))
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub sort: Option<String>,
    pub page: Option<usize>,
}

/// GET /api/v1/listings/search
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<AppResponse<SearchPage>>> {
    let sort = match params.sort.as_deref() {
        None => None,
        Some("asc") => Some(SortOrder::Asc),
        Some("desc") => Some(SortOrder::Desc),
        Some(other) => {
            return Err(AppError::Validation(format!("Unknown sort order: {other}")));
        }
    };
    let page = state
        .consignment
        .search(ListingSearch {
            search: params.search,
            category: params.category,
            max_price: params.price,
            sort,
            page: params.page.unwrap_or(1),
            per_page: 0,
        })
        .await?;
    Ok(ok(page))
}

/// GET /api/v1/listings/admin - uncached admin view
pub async fn list_all(
    State(state): State<AppState>,
) -> AppResult<Json<AppResponse<Vec<Listing>>>> {
    Ok(ok(state.consignment.list_all().await?))
}

/// GET /api/v1/listings/seller/{user_id}
pub async fn list_by_seller(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<AppResponse<Vec<Listing>>>> {
    Ok(ok(state.consignment.list_by_seller(&user_id).await?))
}

/// GET /api/v1/listings/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Listing>>> {
    Ok(ok(state.consignment.get(&id).await?))
}

/// PUT /api/v1/listings/{id}
///
/// Admin edit. Multipart form: optional `product_details` JSON patch,
/// optional `commission`, optional replacement `photos` set.
pub async fn edit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> AppResult<Json<AppResponse<Listing>>> {
    let form = PhotoForm::parse(multipart).await?;
    let product_patch = form.json_or_default("product_details")?;
    let commission = match form.text("commission") {
        Ok(raw) => Some(
            raw.parse::<f64>()
                .map_err(|e| AppError::Validation(format!("Invalid commission: {e}")))?,
        ),
        Err(_) => None,
    };
    let updated = state
        .consignment
        .edit_by_admin(&id, product_patch, commission, form.photos)
        .await?;
    Ok(ok_with_message(updated, "Listing updated"))
}

/// DELETE /api/v1/listings/{id} - admin removal
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<()>>> {
    state.consignment.delete_by_admin(&id).await?;
    Ok(ok_with_message((), "Listing deleted"))
}
