//! Menu API Module

mod handler;

use axum::{
    Router, middleware,
    routing::{get, put},
};

use crate::auth::require_admin;
use crate::core::ServerState;

/// `/api/menus/user` for any authenticated caller, the rest admin-only
pub fn router() -> Router<ServerState> {
    let user_routes = Router::new().route("/api/menus/user", get(handler::user_menus));

    let admin_routes = Router::new()
        .route("/api/menus", get(handler::list).post(handler::create))
        .route(
            "/api/menus/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
        .route(
            "/api/menus/roles/{role_id}/menus/{menu_id}/access",
            put(handler::update_role_access),
        )
        .layer(middleware::from_fn(require_admin));

    user_routes.merge(admin_routes)
}
