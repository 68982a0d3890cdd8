//! Order API module

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/v1/orders", order_routes())
}

fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handler::place))
        .route("/my/{user_id}", get(handler::my_orders))
        .route("/admin", get(handler::all_orders))
        .route(
            "/{id}",
            get(handler::get_by_id).delete(handler::delete),
        )
        .route("/{id}/process", post(handler::process))
}
