//! Role Repository

use super::{RepoError, RepoResult};
use shared::error::ErrorCode;
use shared::models::{Role, RoleCreate, RoleUpdate};
use shared::util::now_millis;
use sqlx::{SqliteConnection, SqlitePool};

const ROLE_COLUMNS: &str = "id, role_name, description, is_default, created_at, updated_at";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Role>> {
    let roles = sqlx::query_as::<_, Role>(&format!(
        "SELECT {ROLE_COLUMNS} FROM roles ORDER BY role_name"
    ))
    .fetch_all(pool)
    .await?;
    Ok(roles)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Role>> {
    let role = sqlx::query_as::<_, Role>(&format!("SELECT {ROLE_COLUMNS} FROM roles WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(role)
}

pub async fn find_by_name(pool: &SqlitePool, role_name: &str) -> RepoResult<Option<Role>> {
    let role = sqlx::query_as::<_, Role>(&format!(
        "SELECT {ROLE_COLUMNS} FROM roles WHERE role_name = ? LIMIT 1"
    ))
    .bind(role_name)
    .fetch_optional(pool)
    .await?;
    Ok(role)
}

/// Roles assigned to a user
pub async fn find_by_user(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<Role>> {
    let roles = sqlx::query_as::<_, Role>(
        "SELECT r.id, r.role_name, r.description, r.is_default, r.created_at, r.updated_at \
         FROM roles r JOIN user_roles ur ON ur.role_id = r.id \
         WHERE ur.user_id = ? ORDER BY r.role_name",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(roles)
}

/// Roles handed to new users that were created without explicit roles
pub async fn find_defaults(pool: &SqlitePool) -> RepoResult<Vec<Role>> {
    let roles = sqlx::query_as::<_, Role>(&format!(
        "SELECT {ROLE_COLUMNS} FROM roles WHERE is_default = 1 ORDER BY role_name"
    ))
    .fetch_all(pool)
    .await?;
    Ok(roles)
}

/// Insert a role and its initial permissions in one transaction
pub async fn create(
    pool: &SqlitePool,
    data: RoleCreate,
    operator_id: i64,
    permission_ids: &[i64],
) -> RepoResult<Role> {
    let now = now_millis();
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "INSERT INTO roles (role_name, description, is_default, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4)",
    )
    .bind(&data.role_name)
    .bind(&data.description)
    .bind(data.is_default)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(duplicate_name)?;

    let role_id = result.last_insert_rowid();
    replace_permissions(&mut *tx, role_id, permission_ids, operator_id, now).await?;
    tx.commit().await?;

    find_by_id(pool, role_id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create role".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: RoleUpdate) -> RepoResult<Role> {
    let (description_set, description) = match data.description {
        Some(value) => (true, value),
        None => (false, None),
    };

    let rows = sqlx::query(
        "UPDATE roles SET role_name = COALESCE(?1, role_name), description = CASE WHEN ?2 THEN ?3 ELSE description END, \
         is_default = COALESCE(?4, is_default), updated_at = ?5 WHERE id = ?6",
    )
    .bind(&data.role_name)
    .bind(description_set)
    .bind(description)
    .bind(data.is_default)
    .bind(now_millis())
    .bind(id)
    .execute(pool)
    .await
    .map_err(duplicate_name)?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::Business(
            ErrorCode::RoleNotFound,
            format!("Role {id} not found"),
        ));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Business(ErrorCode::RoleNotFound, format!("Role {id} not found")))
}

/// Replace the complete permission set of a role
pub async fn replace_permissions(
    conn: &mut SqliteConnection,
    role_id: i64,
    permission_ids: &[i64],
    operator_id: i64,
    now: i64,
) -> RepoResult<()> {
    sqlx::query("DELETE FROM role_permissions WHERE role_id = ?")
        .bind(role_id)
        .execute(&mut *conn)
        .await?;

    for permission_id in permission_ids {
        sqlx::query(
            "INSERT INTO role_permissions (role_id, permission_id, created_by, updated_by, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?3, ?4, ?4)",
        )
        .bind(role_id)
        .bind(permission_id)
        .bind(operator_id)
        .bind(now)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Delete a role; refused while users, permissions or menus reference it
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    let result = sqlx::query("DELETE FROM roles WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .map_err(RepoError::from);

    match result {
        Ok(rows) if rows.rows_affected() == 0 => Err(RepoError::Business(
            ErrorCode::RoleNotFound,
            format!("Role {id} not found"),
        )),
        Ok(_) => Ok(()),
        Err(RepoError::Reference(_)) => Err(RepoError::Business(
            ErrorCode::RoleInUse,
            format!("Role {id} is still assigned to users, permissions or menus"),
        )),
        Err(e) => Err(e),
    }
}

fn duplicate_name(err: sqlx::Error) -> RepoError {
    match RepoError::from(err) {
        RepoError::Duplicate(_) => {
            RepoError::Business(ErrorCode::RoleNameExists, "Role name already exists".into())
        }
        other => other,
    }
}
