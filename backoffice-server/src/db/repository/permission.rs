//! Permission Repository

use super::{RepoError, RepoResult, push_id_list};
use shared::error::ErrorCode;
use shared::models::{Permission, PermissionAction, PermissionCreate, PermissionUpdate};
use shared::util::now_millis;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

pub async fn find_all(pool: &SqlitePool, module: Option<&str>) -> RepoResult<Vec<Permission>> {
    let permissions = sqlx::query_as::<_, Permission>(
        "SELECT id, name, module, action, description, is_active, created_at, updated_at FROM permissions WHERE (?1 IS NULL OR module = ?1) ORDER BY module, action, name",
    )
    .bind(module)
    .fetch_all(pool)
    .await?;
    Ok(permissions)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Permission>> {
    let permission = sqlx::query_as::<_, Permission>(
        "SELECT id, name, module, action, description, is_active, created_at, updated_at FROM permissions WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(permission)
}

pub async fn find_by_name(pool: &SqlitePool, name: &str) -> RepoResult<Option<Permission>> {
    let permission = sqlx::query_as::<_, Permission>(
        "SELECT id, name, module, action, description, is_active, created_at, updated_at FROM permissions WHERE name = ? LIMIT 1",
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;
    Ok(permission)
}

pub async fn find_by_module_action(
    pool: &SqlitePool,
    module: &str,
    action: PermissionAction,
) -> RepoResult<Option<Permission>> {
    let permission = sqlx::query_as::<_, Permission>(
        "SELECT id, name, module, action, description, is_active, created_at, updated_at FROM permissions WHERE module = ? AND action = ? LIMIT 1",
    )
    .bind(module)
    .bind(action)
    .fetch_optional(pool)
    .await?;
    Ok(permission)
}

/// Permissions granted to a role
pub async fn find_by_role(pool: &SqlitePool, role_id: i64) -> RepoResult<Vec<Permission>> {
    let permissions = sqlx::query_as::<_, Permission>(
        "SELECT p.id, p.name, p.module, p.action, p.description, p.is_active, p.created_at, p.updated_at \
         FROM permissions p JOIN role_permissions rp ON rp.permission_id = p.id \
         WHERE rp.role_id = ? ORDER BY p.module, p.action, p.name",
    )
    .bind(role_id)
    .fetch_all(pool)
    .await?;
    Ok(permissions)
}

/// Ids of the active permissions granted to any of `role_ids`
pub async fn find_active_ids_by_roles(pool: &SqlitePool, role_ids: &[i64]) -> RepoResult<Vec<i64>> {
    if role_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT DISTINCT rp.permission_id FROM role_permissions rp \
         JOIN permissions p ON p.id = rp.permission_id \
         WHERE p.is_active = 1 AND rp.role_id IN (",
    );
    push_id_list(&mut qb, role_ids);

    let ids = qb.build_query_scalar::<i64>().fetch_all(pool).await?;
    Ok(ids)
}

pub async fn create(pool: &SqlitePool, data: PermissionCreate) -> RepoResult<Permission> {
    let now = now_millis();
    let result = sqlx::query(
        "INSERT INTO permissions (name, module, action, description, is_active, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
    )
    .bind(&data.name)
    .bind(&data.module)
    .bind(data.action)
    .bind(&data.description)
    .bind(data.is_active.unwrap_or(true))
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| duplicate_as(e, "Permission name or module/action already exists"))?;

    let id = result.last_insert_rowid();
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create permission".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: PermissionUpdate) -> RepoResult<Permission> {
    let (description_set, description) = match data.description {
        Some(value) => (true, value),
        None => (false, None),
    };

    let rows = sqlx::query(
        "UPDATE permissions SET name = COALESCE(?1, name), module = COALESCE(?2, module), action = COALESCE(?3, action), \
         description = CASE WHEN ?4 THEN ?5 ELSE description END, is_active = COALESCE(?6, is_active), updated_at = ?7 WHERE id = ?8",
    )
    .bind(&data.name)
    .bind(&data.module)
    .bind(data.action)
    .bind(description_set)
    .bind(description)
    .bind(data.is_active)
    .bind(now_millis())
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| duplicate_as(e, "Permission name or module/action already exists"))?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Permission {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Permission {id} not found")))
}

/// Delete a permission; refused while roles or menus reference it
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    let result = sqlx::query("DELETE FROM permissions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .map_err(RepoError::from);

    match result {
        Ok(rows) if rows.rows_affected() == 0 => Err(RepoError::Business(
            ErrorCode::PermissionNotFound,
            format!("Permission {id} not found"),
        )),
        Ok(_) => Ok(()),
        Err(RepoError::Reference(_)) => Err(RepoError::Business(
            ErrorCode::PermissionInUse,
            format!("Permission {id} is assigned to roles or menus"),
        )),
        Err(e) => Err(e),
    }
}

fn duplicate_as(err: sqlx::Error, message: &str) -> RepoError {
    match RepoError::from(err) {
        RepoError::Duplicate(_) => RepoError::Business(ErrorCode::PermissionExists, message.into()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn payroll_audit() -> PermissionCreate {
        PermissionCreate {
            name: "Audit Payroll".into(),
            module: "PayrollAudit".into(),
            action: PermissionAction::Read,
            description: Some("Read-only payroll audit trail".into()),
            is_active: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let pool = test_pool().await;
        let created = create(&pool, payroll_audit()).await.unwrap();
        assert_eq!(created.module, "PayrollAudit");
        assert_eq!(created.action, PermissionAction::Read);
        assert!(created.is_active);

        let by_name = find_by_name(&pool, "Audit Payroll").await.unwrap().unwrap();
        assert_eq!(by_name.id, created.id);

        let by_key = find_by_module_action(&pool, "PayrollAudit", PermissionAction::Read)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_key.id, created.id);

        let module = find_all(&pool, Some("PayrollAudit")).await.unwrap();
        assert_eq!(module.len(), 1);
        assert!(find_all(&pool, None).await.unwrap().len() > 1);
    }

    #[tokio::test]
    async fn test_create_duplicate_module_action() {
        let pool = test_pool().await;
        create(&pool, payroll_audit()).await.unwrap();

        let mut again = payroll_audit();
        again.name = "Audit Payroll Again".into();
        let err = create(&pool, again).await.unwrap_err();
        assert!(matches!(err, RepoError::Business(ErrorCode::PermissionExists, _)));
    }

    #[tokio::test]
    async fn test_update_partial_and_clear_description() {
        let pool = test_pool().await;
        let created = create(&pool, payroll_audit()).await.unwrap();

        let updated = update(
            &pool,
            created.id,
            PermissionUpdate {
                name: Some("Audit Payroll Runs".into()),
                description: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "Audit Payroll Runs");
        assert_eq!(updated.module, "PayrollAudit");
        assert_eq!(updated.description, None);

        let kept = update(&pool, created.id, PermissionUpdate::default())
            .await
            .unwrap();
        assert_eq!(kept.name, "Audit Payroll Runs");
    }

    #[tokio::test]
    async fn test_update_missing() {
        let pool = test_pool().await;
        let err = update(&pool, 9999, PermissionUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_in_use_is_refused() {
        let pool = test_pool().await;
        // Seeded "Manage Menus" is granted to the admin role
        let seeded = find_by_name(&pool, "Manage Menus").await.unwrap().unwrap();
        let err = delete(&pool, seeded.id).await.unwrap_err();
        assert!(matches!(err, RepoError::Business(ErrorCode::PermissionInUse, _)));
        assert!(find_by_id(&pool, seeded.id).await.unwrap().is_some());

        let unused = create(&pool, payroll_audit()).await.unwrap();
        delete(&pool, unused.id).await.unwrap();
        assert!(find_by_id(&pool, unused.id).await.unwrap().is_none());

        let err = delete(&pool, unused.id).await.unwrap_err();
        assert!(matches!(err, RepoError::Business(ErrorCode::PermissionNotFound, _)));
    }

    #[tokio::test]
    async fn test_active_ids_by_roles_skips_inactive() {
        let pool = test_pool().await;
        let employee: i64 = sqlx::query_scalar("SELECT id FROM roles WHERE role_name = 'employee'")
            .fetch_one(&pool)
            .await
            .unwrap();

        let before = find_active_ids_by_roles(&pool, &[employee]).await.unwrap();
        assert_eq!(before.len(), 4);

        let leave = find_by_name(&pool, "Request Leave").await.unwrap().unwrap();
        update(
            &pool,
            leave.id,
            PermissionUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let after = find_active_ids_by_roles(&pool, &[employee]).await.unwrap();
        assert_eq!(after.len(), 3);
        assert!(!after.contains(&leave.id));
        assert!(find_active_ids_by_roles(&pool, &[]).await.unwrap().is_empty());
    }
}
