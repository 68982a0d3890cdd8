//! Consignment listing API module

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/v1/listings", listing_routes())
}

fn listing_routes() -> Router<AppState> {
    Router::new()
        .route("/latest", get(handler::latest))
        .route("/categories", get(handler::categories))
        .route("/search", get(handler::search))
        .route("/admin", get(handler::list_all))
        .route("/seller/{user_id}", get(handler::list_by_seller))
        .route("/promote/{query_id}", post(handler::promote))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::edit)
                .delete(handler::delete),
        )
}
