//! Permission API Handlers

use axum::Extension;
use axum::extract::State;
use http::StatusCode;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::permission;
use crate::utils::validation::{
    MAX_LABEL_LEN, MAX_NAME_LEN, MAX_NOTE_LEN, validate_nullable_text, validate_optional_text,
    validate_required_text,
};
use crate::utils::{ApiJson, ApiPath, ApiQuery, ApiResponse, AppError, AppResult, ErrorCode};
use shared::models::{Permission, PermissionCreate, PermissionQuery, PermissionUpdate};

fn permission_not_found(id: i64) -> AppError {
    AppError::with_message(
        ErrorCode::PermissionNotFound,
        format!("Permission {id} not found"),
    )
}

/// GET /api/permissions?module=
pub async fn list(
    State(state): State<ServerState>,
    ApiQuery(query): ApiQuery<PermissionQuery>,
) -> AppResult<ApiResponse<Vec<Permission>>> {
    let module = query.module.as_deref().filter(|m| !m.is_empty());
    let permissions = permission::find_all(&state.pool, module).await?;
    Ok(ApiResponse::success(permissions))
}

/// GET /api/permissions/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<Permission>> {
    let permission = permission::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| permission_not_found(id))?;
    Ok(ApiResponse::success(permission))
}

/// POST /api/permissions
pub async fn create(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<PermissionCreate>,
) -> AppResult<(StatusCode, ApiResponse<Permission>)> {
    tracing::info!(
        user_id = %current_user.id,
        username = %current_user.username,
        module = %payload.module,
        action = %payload.action,
        "Creating permission"
    );

    validate_required_text(&payload.name, "name", MAX_LABEL_LEN)?;
    validate_required_text(&payload.module, "module", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;

    let created = permission::create(&state.pool, payload).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::success_with_message("Permission created", created),
    ))
}

/// PUT /api/permissions/{id}
pub async fn update(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<PermissionUpdate>,
) -> AppResult<ApiResponse<Permission>> {
    tracing::info!(
        user_id = %current_user.id,
        username = %current_user.username,
        permission_id = %id,
        "Updating permission"
    );

    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_LABEL_LEN)?;
    }
    if let Some(module) = &payload.module {
        validate_required_text(module, "module", MAX_NAME_LEN)?;
    }
    validate_nullable_text(&payload.description, "description", MAX_NOTE_LEN)?;

    permission::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| permission_not_found(id))?;

    let updated = permission::update(&state.pool, id, payload).await?;
    Ok(ApiResponse::success_with_message("Permission updated", updated))
}

/// DELETE /api/permissions/{id}
pub async fn delete(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<()>> {
    tracing::info!(
        user_id = %current_user.id,
        username = %current_user.username,
        permission_id = %id,
        "Deleting permission"
    );

    permission::delete(&state.pool, id).await?;
    Ok(ApiResponse::message("Permission deleted"))
}
