//! User Repository

use super::{RepoError, RepoResult};
use shared::error::ErrorCode;
use shared::models::User;
use shared::util::now_millis;
use sqlx::{SqliteConnection, SqlitePool};

const USER_COLUMNS: &str = "id, username, display_name, is_active, created_at, updated_at";

/// User row together with its password hash, only used by login
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserCredentials {
    #[sqlx(flatten)]
    pub user: User,
    pub password_hash: String,
}

/// Validated input of [`create`]
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    pub display_name: &'a str,
}

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<User>> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY username"
    ))
    .fetch_all(pool)
    .await?;
    Ok(users)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn find_by_username(pool: &SqlitePool, username: &str) -> RepoResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = ? LIMIT 1"
    ))
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn find_credentials(
    pool: &SqlitePool,
    username: &str,
) -> RepoResult<Option<UserCredentials>> {
    let row = sqlx::query_as::<_, UserCredentials>(&format!(
        "SELECT {USER_COLUMNS}, password_hash FROM users WHERE username = ? LIMIT 1"
    ))
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Insert a user and assign `role_ids` in one transaction
pub async fn create(pool: &SqlitePool, data: NewUser<'_>, role_ids: &[i64]) -> RepoResult<User> {
    let now = now_millis();
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "INSERT INTO users (username, password_hash, display_name, is_active, created_at, updated_at) VALUES (?1, ?2, ?3, 1, ?4, ?4)",
    )
    .bind(data.username)
    .bind(data.password_hash)
    .bind(data.display_name)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => RepoError::Business(
            ErrorCode::UsernameExists,
            format!("Username '{}' already exists", data.username),
        ),
        other => other,
    })?;

    let user_id = result.last_insert_rowid();
    replace_roles(&mut *tx, user_id, role_ids, now).await?;
    tx.commit().await?;

    find_by_id(pool, user_id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create user".into()))
}

/// Replace the complete role set of a user
pub async fn replace_roles(
    conn: &mut SqliteConnection,
    user_id: i64,
    role_ids: &[i64],
    now: i64,
) -> RepoResult<()> {
    sqlx::query("DELETE FROM user_roles WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    for role_id in role_ids {
        sqlx::query("INSERT INTO user_roles (user_id, role_id, created_at) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(role_id)
            .bind(now)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Replace a user's roles in its own transaction
pub async fn set_roles(pool: &SqlitePool, user_id: i64, role_ids: &[i64]) -> RepoResult<()> {
    let mut tx = pool.begin().await?;
    replace_roles(&mut *tx, user_id, role_ids, now_millis()).await?;
    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::role;
    use crate::db::test_pool;

    fn jane() -> NewUser<'static> {
        NewUser {
            username: "jane.doe",
            password_hash: "$argon2id$placeholder",
            display_name: "Jane Doe",
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let pool = test_pool().await;
        let employee = role::find_by_name(&pool, "employee").await.unwrap().unwrap();

        let user = create(&pool, jane(), &[employee.id]).await.unwrap();
        assert_eq!(user.username, "jane.doe");
        assert!(user.is_active);

        let creds = find_credentials(&pool, "jane.doe").await.unwrap().unwrap();
        assert_eq!(creds.user.id, user.id);
        assert_eq!(creds.password_hash, "$argon2id$placeholder");

        let roles = role::find_by_user(&pool, user.id).await.unwrap();
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].role_name, "employee");

        assert!(find_by_username(&pool, "nobody").await.unwrap().is_none());
        assert_eq!(find_all(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let pool = test_pool().await;
        create(&pool, jane(), &[]).await.unwrap();
        let err = create(&pool, jane(), &[]).await.unwrap_err();
        assert!(matches!(err, RepoError::Business(ErrorCode::UsernameExists, _)));
    }

    #[tokio::test]
    async fn test_set_roles_replaces_all() {
        let pool = test_pool().await;
        let admin = role::find_by_name(&pool, "admin").await.unwrap().unwrap();
        let employee = role::find_by_name(&pool, "employee").await.unwrap().unwrap();
        let user = create(&pool, jane(), &[employee.id]).await.unwrap();

        set_roles(&pool, user.id, &[admin.id]).await.unwrap();
        let roles = role::find_by_user(&pool, user.id).await.unwrap();
        assert_eq!(roles.iter().map(|r| r.id).collect::<Vec<_>>(), vec![admin.id]);

        set_roles(&pool, user.id, &[]).await.unwrap();
        assert!(role::find_by_user(&pool, user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_rolls_back_on_unknown_role() {
        let pool = test_pool().await;
        let err = create(&pool, jane(), &[31337]).await.unwrap_err();
        assert!(matches!(err, RepoError::Reference(_)));
        assert!(find_by_username(&pool, "jane.doe").await.unwrap().is_none());
    }
}
