//! Permission API Module

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::require_admin;
use crate::core::ServerState;

/// Permission catalog administration, admin only
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/permissions", get(handler::list).post(handler::create))
        .route(
            "/api/permissions/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
        .layer(middleware::from_fn(require_admin))
}
