//! Intake query API module

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/v1/queries", query_routes())
}

fn query_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handler::submit))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::edit)
                .delete(handler::delete),
        )
        .route("/{id}/advance", post(handler::advance))
        .route("/{id}/reject", post(handler::reject))
        .route("/user/{user_id}", get(handler::list_by_owner))
        .route("/status/{status}", get(handler::list_by_status))
}
