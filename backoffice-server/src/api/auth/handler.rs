//! Authentication Handlers

use std::time::Duration;

use axum::extract::State;

use crate::auth::CurrentUser;
use crate::auth::password::verify_credentials_blocking;
use crate::core::ServerState;
use crate::db::repository::{role, user};
use crate::security_log;
use crate::utils::{ApiJson, ApiResponse, AppError, AppResult, ErrorCode};
use shared::models::{LoginRequest, LoginResponse, UserWithRoles};

/// Fixed delay added to every login attempt to slow credential guessing
const AUTH_FIXED_DELAY_MS: u64 = 200;

/// POST /api/auth/login
pub async fn login(
    State(state): State<ServerState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> AppResult<ApiResponse<LoginResponse>> {
    let username = req.username.trim();
    if username.is_empty() || req.password.is_empty() {
        return Err(AppError::invalid_field(
            if username.is_empty() { "username" } else { "password" },
            "username and password are required",
        ));
    }

    let credentials = user::find_credentials(&state.pool, username).await?;

    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    // Unknown users still pay for one Argon2 verification; same error either way
    let stored = credentials.as_ref().map(|c| c.password_hash.clone());
    let verified = verify_credentials_blocking(req.password.clone(), stored).await?;
    let credentials = match credentials {
        Some(c) if verified => c,
        Some(_) => {
            security_log!("WARN", "login_failed", username = username, reason = "invalid_password");
            return Err(AppError::invalid_credentials());
        }
        None => {
            security_log!("WARN", "login_failed", username = username, reason = "user_not_found");
            return Err(AppError::invalid_credentials());
        }
    };

    let account = credentials.user;
    if !account.is_active {
        security_log!("WARN", "login_disabled", username = username, user_id = account.id);
        return Err(AppError::new(ErrorCode::AccountDisabled));
    }

    let roles: Vec<String> = role::find_by_user(&state.pool, account.id)
        .await?
        .into_iter()
        .map(|r| r.role_name)
        .collect();

    let jwt_service = state.get_jwt_service();
    let token = jwt_service
        .generate_token(account.id, &account.username, &roles)
        .map_err(|e| AppError::internal(format!("Failed to issue token: {e}")))?;

    tracing::info!(user_id = account.id, username = %account.username, "User logged in");

    Ok(ApiResponse::success(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: jwt_service.expires_in_seconds(),
        user: account,
        roles,
    }))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<ApiResponse<UserWithRoles>> {
    let user = user::find_by_id(&state.pool, current_user.id)
        .await?
        .ok_or_else(|| AppError::with_message(ErrorCode::UserNotFound, "User no longer exists"))?;
    let roles = role::find_by_user(&state.pool, user.id).await?;

    Ok(ApiResponse::success(UserWithRoles { user, roles }))
}
