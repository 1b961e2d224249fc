//! Role API Module

mod handler;

use axum::{
    Router, middleware,
    routing::{get, put},
};

use crate::auth::require_admin;
use crate::core::ServerState;

/// Role administration, admin only
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/roles", get(handler::list).post(handler::create))
        .route(
            "/api/roles/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
        .route("/api/roles/{id}/permissions", put(handler::update_role_permissions))
        .layer(middleware::from_fn(require_admin))
}
