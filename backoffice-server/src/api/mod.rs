//! HTTP API
//!
//! # Routes
//!
//! | Module | Prefix | Access |
//! |--------|--------|--------|
//! | [`health`] | /api/health | public |
//! | [`auth`] | /api/auth | login public, `me` authenticated |
//! | [`menus`] | /api/menus | `user` authenticated, everything else admin |
//! | [`roles`] | /api/roles | admin |
//! | [`permissions`] | /api/permissions | admin |
//! | [`users`] | /api/users | admin |

pub mod auth;
pub mod health;
pub mod menus;
pub mod permissions;
pub mod roles;
pub mod users;

use axum::{Router, middleware};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::auth::require_auth;
use crate::core::ServerState;

/// Upper bound on requests served at once
const MAX_CONCURRENT_REQUESTS: usize = 100;

/// All routes, without middleware or state
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(menus::router())
        .merge(roles::router())
        .merge(permissions::router())
        .merge(users::router())
}

/// Fully configured application, used by the server and by router tests
pub fn build_app(state: ServerState) -> Router {
    let app = build_router()
        // JWT authentication; skips public routes and injects CurrentUser
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENT_REQUESTS));

    let app = if state.config.is_development() {
        app.layer(CorsLayer::permissive())
    } else {
        app
    };

    app.with_state(state)
}
