//! User API Module

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::require_admin;
use crate::core::ServerState;

/// User administration, admin only
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/users", get(handler::list).post(handler::create))
        .route(
            "/api/users/{id}/roles",
            get(handler::get_roles).put(handler::update_roles),
        )
        .layer(middleware::from_fn(require_admin))
}
