//! Repository Module
//!
//! Explicit data-access functions per table. Reads take the pool; writes that
//! belong to a multi-statement mutation take `&mut SqliteConnection` so callers
//! can run them inside one transaction.

pub mod menu;
pub mod permission;
pub mod role;
pub mod user;

use shared::error::{AppError, ErrorCode};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    /// A foreign key constraint rejected the statement
    #[error("Reference violation: {0}")]
    Reference(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{1}")]
    Business(ErrorCode, String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return RepoError::Duplicate(db_err.message().to_string());
            }
            if db_err.is_foreign_key_violation() || is_restrict_violation(&**db_err) {
                return RepoError::Reference(db_err.message().to_string());
            }
        }
        RepoError::Database(err.to_string())
    }
}

/// SQLite extended code raised by `ON DELETE RESTRICT` actions
const SQLITE_CONSTRAINT_TRIGGER: &str = "1811";

/// `ON DELETE RESTRICT` fails with `SQLITE_CONSTRAINT_TRIGGER` instead of
/// `SQLITE_CONSTRAINT_FOREIGNKEY`; user triggers share the code, so the
/// message decides.
fn is_restrict_violation(db_err: &dyn sqlx::error::DatabaseError) -> bool {
    db_err.code().as_deref() == Some(SQLITE_CONSTRAINT_TRIGGER)
        && db_err.message().contains("FOREIGN KEY constraint failed")
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::with_message(ErrorCode::NotFound, msg),
            RepoError::Duplicate(msg) => AppError::with_message(ErrorCode::AlreadyExists, msg),
            RepoError::Reference(msg) => AppError::with_message(ErrorCode::ValidationFailed, msg),
            RepoError::Validation(msg) => AppError::validation(msg),
            RepoError::Business(code, msg) => AppError::with_message(code, msg),
            RepoError::Database(msg) => {
                tracing::error!(error = %msg, "Database operation failed");
                AppError::new(ErrorCode::DatabaseError)
            }
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Tables whose ids can be checked with [`find_missing_ids`]
#[derive(Debug, Clone, Copy)]
pub enum IdTable {
    Permissions,
    Roles,
    Menus,
}

impl IdTable {
    fn name(self) -> &'static str {
        match self {
            Self::Permissions => "permissions",
            Self::Roles => "roles",
            Self::Menus => "menus",
        }
    }
}

/// Return the ids from `ids` that have no row in `table`, in input order
pub async fn find_missing_ids(
    pool: &SqlitePool,
    table: IdTable,
    ids: &[i64],
) -> RepoResult<Vec<i64>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT id FROM {} WHERE id IN (", table.name()));
    push_id_list(&mut qb, ids);

    let found: std::collections::HashSet<i64> =
        qb.build_query_scalar::<i64>().fetch_all(pool).await?.into_iter().collect();

    Ok(ids.iter().copied().filter(|id| !found.contains(id)).collect())
}

/// Push `a, b, c)` onto a builder that already ends with `IN (`
pub(crate) fn push_id_list(qb: &mut QueryBuilder<'_, Sqlite>, ids: &[i64]) {
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn test_find_missing_ids() {
        let pool = test_pool().await;
        let admin_id: i64 = sqlx::query_scalar("SELECT id FROM roles WHERE role_name = 'admin'")
            .fetch_one(&pool)
            .await
            .unwrap();

        let missing = find_missing_ids(&pool, IdTable::Roles, &[admin_id, 9000, 9001])
            .await
            .unwrap();
        assert_eq!(missing, vec![9000, 9001]);

        assert!(
            find_missing_ids(&pool, IdTable::Menus, &[])
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_unique_violation_maps_to_duplicate() {
        let pool = test_pool().await;
        let err = sqlx::query("INSERT INTO roles (role_name) VALUES ('admin')")
            .execute(&pool)
            .await
            .unwrap_err();
        assert!(matches!(RepoError::from(err), RepoError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_foreign_key_violation_maps_to_reference() {
        let pool = test_pool().await;
        let err = sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES (4040, 4040)")
            .execute(&pool)
            .await
            .unwrap_err();
        assert!(matches!(RepoError::from(err), RepoError::Reference(_)));
    }

    #[tokio::test]
    async fn test_restricted_delete_maps_to_reference() {
        let pool = test_pool().await;
        // The admin role still holds seeded permissions
        let err = sqlx::query("DELETE FROM roles WHERE role_name = 'admin'")
            .execute(&pool)
            .await
            .unwrap_err();
        assert!(matches!(RepoError::from(err), RepoError::Reference(_)));
    }

    #[tokio::test]
    async fn test_trigger_abort_stays_database_error() {
        let pool = test_pool().await;
        sqlx::query(
            "CREATE TRIGGER block_roles BEFORE INSERT ON roles \
             BEGIN SELECT RAISE(ABORT, 'roles are frozen'); END",
        )
        .execute(&pool)
        .await
        .unwrap();

        let err = sqlx::query("INSERT INTO roles (role_name) VALUES ('auditor')")
            .execute(&pool)
            .await
            .unwrap_err();
        assert!(matches!(RepoError::from(err), RepoError::Database(_)));
    }

    #[test]
    fn test_database_error_is_generic_to_clients() {
        let app: AppError = RepoError::Database("disk I/O error at page 12".into()).into();
        assert_eq!(app.code, ErrorCode::DatabaseError);
        assert_eq!(app.message, "Database error");
    }

    #[test]
    fn test_business_error_keeps_code() {
        let app: AppError =
            RepoError::Business(ErrorCode::RoleInUse, "Role 3 is assigned to users".into()).into();
        assert_eq!(app.code, ErrorCode::RoleInUse);
        assert_eq!(app.message, "Role 3 is assigned to users");
    }
}
