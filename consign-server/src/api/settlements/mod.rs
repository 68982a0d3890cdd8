//! Settlement ledger API module

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/v1/settlements", settlement_routes())
}

fn settlement_routes() -> Router<AppState> {
    Router::new()
        .route("/pending", get(handler::list_pending))
        .route("/seller/{user_id}", get(handler::list_by_seller))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/complete", post(handler::complete))
}
