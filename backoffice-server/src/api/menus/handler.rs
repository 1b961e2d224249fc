//! Menu API Handlers

use axum::Extension;
use axum::extract::State;
use http::StatusCode;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::services::{get_user_menus, menu_admin};
use crate::utils::{ApiJson, ApiPath, ApiQuery, ApiResponse, AppResult};
use shared::models::{
    Menu, MenuCreate, MenuListQuery, MenuListing, MenuNode, MenuUpdate, MenuWithRelations,
    RoleMenuAccessResult, RoleMenuAccessUpdate,
};

/// GET /api/menus/user - menu tree of the caller
pub async fn user_menus(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<ApiResponse<Vec<MenuNode<Menu>>>> {
    let menus = get_user_menus(&state.pool, current_user.id).await?;
    Ok(ApiResponse::success(menus))
}

/// GET /api/menus - all menus as tree and flat list
pub async fn list(
    State(state): State<ServerState>,
    ApiQuery(query): ApiQuery<MenuListQuery>,
) -> AppResult<ApiResponse<MenuListing>> {
    let listing = menu_admin::get_all_menus(&state.pool, query).await?;
    Ok(ApiResponse::success(listing))
}

/// GET /api/menus/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<MenuWithRelations>> {
    let menu = menu_admin::get_menu_by_id(&state.pool, id).await?;
    Ok(ApiResponse::success(menu))
}

/// POST /api/menus
pub async fn create(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<MenuCreate>,
) -> AppResult<(StatusCode, ApiResponse<MenuWithRelations>)> {
    tracing::info!(
        user_id = %current_user.id,
        username = %current_user.username,
        menu_name = %payload.menu_name,
        "Creating menu"
    );

    let menu = menu_admin::create_menu(&state.pool, current_user.id, payload).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::success_with_message("Menu created", menu),
    ))
}

/// PUT /api/menus/{id}
pub async fn update(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<MenuUpdate>,
) -> AppResult<ApiResponse<MenuWithRelations>> {
    tracing::info!(
        user_id = %current_user.id,
        username = %current_user.username,
        menu_id = %id,
        "Updating menu"
    );

    let menu = menu_admin::update_menu(&state.pool, current_user.id, id, payload).await?;
    Ok(ApiResponse::success_with_message("Menu updated", menu))
}

/// DELETE /api/menus/{id}
pub async fn delete(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<()>> {
    tracing::info!(
        user_id = %current_user.id,
        username = %current_user.username,
        menu_id = %id,
        "Deleting menu"
    );

    menu_admin::delete_menu(&state.pool, current_user.id, id).await?;
    Ok(ApiResponse::message("Menu deleted"))
}

/// PUT /api/menus/roles/{role_id}/menus/{menu_id}/access
pub async fn update_role_access(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    ApiPath((role_id, menu_id)): ApiPath<(i64, i64)>,
    ApiJson(payload): ApiJson<RoleMenuAccessUpdate>,
) -> AppResult<ApiResponse<RoleMenuAccessResult>> {
    let result = menu_admin::update_role_menu_access(
        &state.pool,
        current_user.id,
        role_id,
        menu_id,
        payload.can_access,
    )
    .await?;

    let message = if result.created {
        "Role menu access created"
    } else {
        "Role menu access updated"
    };
    Ok(ApiResponse::success_with_message(message, result))
}
