//! User API Handlers

use axum::Extension;
use axum::extract::State;
use http::StatusCode;

use crate::auth::CurrentUser;
use crate::auth::password::hash_password_blocking;
use crate::core::ServerState;
use crate::db::repository::user::NewUser;
use crate::db::repository::{IdTable, role, user};
use crate::utils::validation::{
    MAX_LABEL_LEN, MAX_PASSWORD_LEN, MIN_PASSWORD_LEN, dedup_ids, ensure_ids_exist,
    validate_ids, validate_optional_text, validate_slug,
};
use crate::utils::{ApiJson, ApiPath, ApiResponse, AppError, AppResult, ErrorCode};
use shared::models::{User, UserCreate, UserRolesUpdate, UserWithRoles};

fn user_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::UserNotFound, format!("User {id} not found"))
}

fn validate_password(password: &str) -> AppResult<()> {
    let len = password.chars().count();
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
        return Err(AppError::invalid_field(
            "password",
            format!("password must be {MIN_PASSWORD_LEN} to {MAX_PASSWORD_LEN} characters"),
        ));
    }
    Ok(())
}

/// GET /api/users
pub async fn list(State(state): State<ServerState>) -> AppResult<ApiResponse<Vec<User>>> {
    let users = user::find_all(&state.pool).await?;
    Ok(ApiResponse::success(users))
}

/// POST /api/users
///
/// Without `role_ids` the user receives every default role.
pub async fn create(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<UserCreate>,
) -> AppResult<(StatusCode, ApiResponse<UserWithRoles>)> {
    tracing::info!(
        user_id = %current_user.id,
        username = %current_user.username,
        new_username = %payload.username,
        "Creating user"
    );

    validate_slug(&payload.username, "username")?;
    validate_password(&payload.password)?;
    validate_optional_text(&payload.display_name, "display_name", MAX_LABEL_LEN)?;

    let role_ids = match &payload.role_ids {
        Some(ids) => {
            let ids = dedup_ids(ids);
            validate_ids(&ids, "role_ids")?;
            ensure_ids_exist(&state.pool, IdTable::Roles, &ids, "role_ids").await?;
            ids
        }
        None => role::find_defaults(&state.pool)
            .await?
            .into_iter()
            .map(|r| r.id)
            .collect(),
    };

    let password_hash = hash_password_blocking(payload.password.clone()).await?;
    let display_name = payload
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(payload.username.as_str());

    let created = user::create(
        &state.pool,
        NewUser {
            username: &payload.username,
            password_hash: &password_hash,
            display_name,
        },
        &role_ids,
    )
    .await?;
    let roles = role::find_by_user(&state.pool, created.id).await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::success_with_message(
            "User created",
            UserWithRoles {
                user: created,
                roles,
            },
        ),
    ))
}

/// GET /api/users/{id}/roles
pub async fn get_roles(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<UserWithRoles>> {
    let found = user::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| user_not_found(id))?;
    let roles = role::find_by_user(&state.pool, id).await?;
    Ok(ApiResponse::success(UserWithRoles { user: found, roles }))
}

/// PUT /api/users/{id}/roles - replace the role set
pub async fn update_roles(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UserRolesUpdate>,
) -> AppResult<ApiResponse<UserWithRoles>> {
    tracing::info!(
        user_id = %current_user.id,
        username = %current_user.username,
        target_user_id = %id,
        roles = payload.role_ids.len(),
        "Replacing user roles"
    );

    let found = user::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| user_not_found(id))?;

    let role_ids = dedup_ids(&payload.role_ids);
    validate_ids(&role_ids, "role_ids")?;
    ensure_ids_exist(&state.pool, IdTable::Roles, &role_ids, "role_ids").await?;

    user::set_roles(&state.pool, id, &role_ids).await?;
    let roles = role::find_by_user(&state.pool, id).await?;

    Ok(ApiResponse::success_with_message(
        "User roles updated",
        UserWithRoles { user: found, roles },
    ))
}
