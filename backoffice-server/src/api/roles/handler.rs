//! Role API Handlers

use axum::Extension;
use axum::extract::State;
use http::StatusCode;
use sqlx::SqlitePool;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{IdTable, RepoError, permission, role};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, dedup_ids, ensure_ids_exist, validate_ids,
    validate_nullable_text, validate_optional_text, validate_required_text,
};
use crate::utils::{ApiJson, ApiPath, ApiResponse, AppError, AppResult, ErrorCode};
use shared::models::{Role, RoleCreate, RoleDetail, RolePermissionsUpdate, RoleUpdate};
use shared::util::now_millis;

fn role_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::RoleNotFound, format!("Role {id} not found"))
}

async fn load_detail(pool: &SqlitePool, role: Role) -> AppResult<RoleDetail> {
    let permissions = permission::find_by_role(pool, role.id).await?;
    Ok(RoleDetail { role, permissions })
}

/// GET /api/roles
pub async fn list(State(state): State<ServerState>) -> AppResult<ApiResponse<Vec<Role>>> {
    let roles = role::find_all(&state.pool).await?;
    Ok(ApiResponse::success(roles))
}

/// GET /api/roles/{id} - role with its permissions
pub async fn get_by_id(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<RoleDetail>> {
    let role = role::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| role_not_found(id))?;
    Ok(ApiResponse::success(load_detail(&state.pool, role).await?))
}

/// POST /api/roles
pub async fn create(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<RoleCreate>,
) -> AppResult<(StatusCode, ApiResponse<RoleDetail>)> {
    tracing::info!(
        user_id = %current_user.id,
        username = %current_user.username,
        role_name = %payload.role_name,
        "Creating role"
    );

    validate_required_text(&payload.role_name, "role_name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_NOTE_LEN)?;
    let permission_ids = dedup_ids(payload.permission_ids.as_deref().unwrap_or_default());
    validate_ids(&permission_ids, "permission_ids")?;

    if role::find_by_name(&state.pool, &payload.role_name).await?.is_some() {
        return Err(AppError::field_error(
            ErrorCode::RoleNameExists,
            "role_name",
            format!("Role '{}' already exists", payload.role_name),
        ));
    }
    ensure_ids_exist(&state.pool, IdTable::Permissions, &permission_ids, "permission_ids").await?;

    let created = role::create(&state.pool, payload, current_user.id, &permission_ids).await?;
    let detail = load_detail(&state.pool, created).await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::success_with_message("Role created", detail),
    ))
}

/// PUT /api/roles/{id}
pub async fn update(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<RoleUpdate>,
) -> AppResult<ApiResponse<RoleDetail>> {
    tracing::info!(
        user_id = %current_user.id,
        username = %current_user.username,
        role_id = %id,
        "Updating role"
    );

    if let Some(name) = &payload.role_name {
        validate_required_text(name, "role_name", MAX_NAME_LEN)?;
    }
    validate_nullable_text(&payload.description, "description", MAX_NOTE_LEN)?;

    role::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| role_not_found(id))?;

    let updated = role::update(&state.pool, id, payload).await?;
    Ok(ApiResponse::success_with_message(
        "Role updated",
        load_detail(&state.pool, updated).await?,
    ))
}

/// DELETE /api/roles/{id}
pub async fn delete(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<()>> {
    tracing::info!(
        user_id = %current_user.id,
        username = %current_user.username,
        role_id = %id,
        "Deleting role"
    );

    role::delete(&state.pool, id).await?;
    Ok(ApiResponse::message("Role deleted"))
}

/// PUT /api/roles/{id}/permissions - replace the permission set
pub async fn update_role_permissions(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<RolePermissionsUpdate>,
) -> AppResult<ApiResponse<RoleDetail>> {
    tracing::info!(
        user_id = %current_user.id,
        username = %current_user.username,
        role_id = %id,
        permissions = payload.permission_ids.len(),
        "Replacing role permissions"
    );

    let role = role::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| role_not_found(id))?;

    let permission_ids = dedup_ids(&payload.permission_ids);
    validate_ids(&permission_ids, "permission_ids")?;
    ensure_ids_exist(&state.pool, IdTable::Permissions, &permission_ids, "permission_ids").await?;

    let mut tx = state.pool.begin().await.map_err(RepoError::from)?;
    role::replace_permissions(&mut *tx, id, &permission_ids, current_user.id, now_millis())
        .await?;
    tx.commit().await.map_err(RepoError::from)?;

    Ok(ApiResponse::success_with_message(
        "Role permissions updated",
        load_detail(&state.pool, role).await?,
    ))
}
