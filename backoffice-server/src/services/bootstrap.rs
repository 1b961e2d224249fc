//! First-run bootstrap

use shared::error::{AppError, AppResult};
use sqlx::SqlitePool;

use crate::auth::{ADMIN_ROLE, password::hash_password};
use crate::db::repository::user::NewUser;
use crate::db::repository::{role, user};

/// Create the administrator account on an empty install
///
/// Does nothing when `username` already exists, so a changed
/// `ADMIN_PASSWORD` never overwrites the stored hash.
pub async fn ensure_admin_user(pool: &SqlitePool, username: &str, password: &str) -> AppResult<()> {
    if user::find_by_username(pool, username).await?.is_some() {
        tracing::debug!(username, "Admin user already present");
        return Ok(());
    }

    let admin = role::find_by_name(pool, ADMIN_ROLE)
        .await?
        .ok_or_else(|| AppError::internal("Built-in admin role is missing"))?;

    let password_hash = hash_password(password)?;
    let created = user::create(
        pool,
        NewUser {
            username,
            password_hash: &password_hash,
            display_name: "Administrator",
        },
        &[admin.id],
    )
    .await?;

    tracing::info!(user_id = created.id, username, "Admin user created");
    Ok(())
}
