//! Menu Repository
//!
//! Reads take the pool. The write functions take `&mut SqliteConnection` and are
//! composed into one transaction by the menu admin service.

use super::{RepoResult, push_id_list};
use shared::models::{Menu, MenuRoleAccess, Permission, RoleMenuAccess};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;

const MENU_COLUMNS: &str = "id, menu_name, menu_label, menu_icon, menu_url, parent_id, menu_order, is_active, created_by, updated_by, created_at, updated_at";
const ACCESS_COLUMNS: &str =
    "id, role_id, menu_id, can_access, created_by, updated_by, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct MenuPermissionRow {
    menu_id: i64,
    #[sqlx(flatten)]
    permission: Permission,
}

#[derive(Debug, sqlx::FromRow)]
struct MenuRoleAccessRow {
    menu_id: i64,
    #[sqlx(flatten)]
    access: MenuRoleAccess,
}

/// Column values of a new menu row
#[derive(Debug, Clone)]
pub struct NewMenu<'a> {
    pub menu_name: &'a str,
    pub menu_label: &'a str,
    pub menu_icon: Option<&'a str>,
    pub menu_url: Option<&'a str>,
    pub parent_id: Option<i64>,
    pub menu_order: i32,
    pub is_active: bool,
}

/// Partial update of a menu row
///
/// `None` keeps the stored value. For the nullable columns the inner option is
/// the new value, so `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct MenuChanges<'a> {
    pub menu_name: Option<&'a str>,
    pub menu_label: Option<&'a str>,
    pub menu_icon: Option<Option<&'a str>>,
    pub menu_url: Option<Option<&'a str>>,
    pub parent_id: Option<Option<i64>>,
    pub menu_order: Option<i32>,
    pub is_active: Option<bool>,
}

// ========== Reads ==========

/// Every menu, ordered by `menu_order` then `menu_label`
pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Menu>> {
    let menus = sqlx::query_as::<_, Menu>(&format!(
        "SELECT {MENU_COLUMNS} FROM menus ORDER BY menu_order, menu_label"
    ))
    .fetch_all(pool)
    .await?;
    Ok(menus)
}

pub async fn find_active(pool: &SqlitePool) -> RepoResult<Vec<Menu>> {
    let menus = sqlx::query_as::<_, Menu>(&format!(
        "SELECT {MENU_COLUMNS} FROM menus WHERE is_active = 1 ORDER BY menu_order, menu_label"
    ))
    .fetch_all(pool)
    .await?;
    Ok(menus)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Menu>> {
    let menu = sqlx::query_as::<_, Menu>(&format!("SELECT {MENU_COLUMNS} FROM menus WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(menu)
}

pub async fn find_by_name(pool: &SqlitePool, menu_name: &str) -> RepoResult<Option<Menu>> {
    let menu = sqlx::query_as::<_, Menu>(&format!(
        "SELECT {MENU_COLUMNS} FROM menus WHERE menu_name = ? LIMIT 1"
    ))
    .bind(menu_name)
    .fetch_optional(pool)
    .await?;
    Ok(menu)
}

pub async fn find_children(pool: &SqlitePool, parent_id: i64) -> RepoResult<Vec<Menu>> {
    let menus = sqlx::query_as::<_, Menu>(&format!(
        "SELECT {MENU_COLUMNS} FROM menus WHERE parent_id = ? ORDER BY menu_order, menu_label"
    ))
    .bind(parent_id)
    .fetch_all(pool)
    .await?;
    Ok(menus)
}

pub async fn count_children(pool: &SqlitePool, parent_id: i64) -> RepoResult<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM menus WHERE parent_id = ?")
        .bind(parent_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Ids on the parent chain above `id`
///
/// `UNION` discards revisited rows, so a corrupted chain that already loops
/// still terminates.
pub async fn find_ancestor_ids(pool: &SqlitePool, id: i64) -> RepoResult<Vec<i64>> {
    let ids = sqlx::query_scalar::<_, i64>(
        "WITH RECURSIVE ancestors(id, parent_id) AS ( \
             SELECT id, parent_id FROM menus WHERE id = ?1 \
             UNION \
             SELECT m.id, m.parent_id FROM menus m JOIN ancestors a ON m.id = a.parent_id \
         ) \
         SELECT id FROM ancestors WHERE id <> ?1",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;
    Ok(ids)
}

/// Levels in the subtree rooted at `id` (1 for a leaf, 0 if the menu is missing)
///
/// The walk stops after `limit` levels.
pub async fn find_subtree_height(pool: &SqlitePool, id: i64, limit: i64) -> RepoResult<i64> {
    let height = sqlx::query_scalar::<_, i64>(
        "WITH RECURSIVE subtree(id, depth) AS ( \
             SELECT id, 1 FROM menus WHERE id = ?1 \
             UNION ALL \
             SELECT m.id, s.depth + 1 FROM menus m JOIN subtree s ON m.parent_id = s.id \
             WHERE s.depth < ?2 \
         ) \
         SELECT COALESCE(MAX(depth), 0) FROM subtree",
    )
    .bind(id)
    .bind(limit)
    .fetch_one(pool)
    .await?;
    Ok(height)
}

/// Permissions declared on a menu
pub async fn find_permissions(pool: &SqlitePool, menu_id: i64) -> RepoResult<Vec<Permission>> {
    let permissions = sqlx::query_as::<_, Permission>(
        "SELECT p.id, p.name, p.module, p.action, p.description, p.is_active, p.created_at, p.updated_at \
         FROM permissions p JOIN menu_permissions mp ON mp.permission_id = p.id \
         WHERE mp.menu_id = ? ORDER BY p.module, p.action, p.name",
    )
    .bind(menu_id)
    .fetch_all(pool)
    .await?;
    Ok(permissions)
}

/// Role grants stored for a menu, with role names
pub async fn find_role_access(pool: &SqlitePool, menu_id: i64) -> RepoResult<Vec<MenuRoleAccess>> {
    let roles = sqlx::query_as::<_, MenuRoleAccess>(
        "SELECT rma.role_id, r.role_name, rma.can_access \
         FROM role_menu_access rma JOIN roles r ON r.id = rma.role_id \
         WHERE rma.menu_id = ? ORDER BY r.role_name",
    )
    .bind(menu_id)
    .fetch_all(pool)
    .await?;
    Ok(roles)
}

/// Declared permissions of every menu, keyed by menu id
pub async fn find_permissions_by_menu(
    pool: &SqlitePool,
) -> RepoResult<HashMap<i64, Vec<Permission>>> {
    let rows = sqlx::query_as::<_, MenuPermissionRow>(
        "SELECT mp.menu_id, p.id, p.name, p.module, p.action, p.description, p.is_active, p.created_at, p.updated_at \
         FROM menu_permissions mp JOIN permissions p ON p.id = mp.permission_id \
         ORDER BY mp.menu_id, p.module, p.action, p.name",
    )
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<i64, Vec<Permission>> = HashMap::new();
    for row in rows {
        grouped.entry(row.menu_id).or_default().push(row.permission);
    }
    Ok(grouped)
}

/// Role grants of every menu, keyed by menu id
pub async fn find_role_access_by_menu(
    pool: &SqlitePool,
) -> RepoResult<HashMap<i64, Vec<MenuRoleAccess>>> {
    let rows = sqlx::query_as::<_, MenuRoleAccessRow>(
        "SELECT rma.menu_id, rma.role_id, r.role_name, rma.can_access \
         FROM role_menu_access rma JOIN roles r ON r.id = rma.role_id \
         ORDER BY rma.menu_id, r.role_name",
    )
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<i64, Vec<MenuRoleAccess>> = HashMap::new();
    for row in rows {
        grouped.entry(row.menu_id).or_default().push(row.access);
    }
    Ok(grouped)
}

/// `(menu_id, permission_id)` for every declared permission of an active menu
pub async fn find_active_permission_links(pool: &SqlitePool) -> RepoResult<Vec<(i64, i64)>> {
    let links = sqlx::query_as::<_, (i64, i64)>(
        "SELECT mp.menu_id, mp.permission_id FROM menu_permissions mp \
         JOIN menus m ON m.id = mp.menu_id WHERE m.is_active = 1",
    )
    .fetch_all(pool)
    .await?;
    Ok(links)
}

/// `(menu_id, role_id)` for every `can_access` grant held by one of `role_ids`
pub async fn find_granted_links(pool: &SqlitePool, role_ids: &[i64]) -> RepoResult<Vec<(i64, i64)>> {
    if role_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT menu_id, role_id FROM role_menu_access WHERE can_access = 1 AND role_id IN (",
    );
    push_id_list(&mut qb, role_ids);

    let links = qb.build_query_as::<(i64, i64)>().fetch_all(pool).await?;
    Ok(links)
}

// ========== Writes ==========

pub async fn insert(
    conn: &mut SqliteConnection,
    menu: &NewMenu<'_>,
    operator_id: i64,
    now: i64,
) -> RepoResult<i64> {
    let result = sqlx::query(
        "INSERT INTO menus (menu_name, menu_label, menu_icon, menu_url, parent_id, menu_order, is_active, created_by, updated_by, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8, ?9, ?9)",
    )
    .bind(menu.menu_name)
    .bind(menu.menu_label)
    .bind(menu.menu_icon)
    .bind(menu.menu_url)
    .bind(menu.parent_id)
    .bind(menu.menu_order)
    .bind(menu.is_active)
    .bind(operator_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Apply `changes` to one menu; returns the number of rows touched
pub async fn update_fields(
    conn: &mut SqliteConnection,
    id: i64,
    changes: &MenuChanges<'_>,
    operator_id: i64,
    now: i64,
) -> RepoResult<u64> {
    let (icon_set, icon) = split_nullable(changes.menu_icon);
    let (url_set, url) = split_nullable(changes.menu_url);
    let (parent_set, parent_id) = split_nullable(changes.parent_id);

    let result = sqlx::query(
        "UPDATE menus SET \
             menu_name = COALESCE(?1, menu_name), \
             menu_label = COALESCE(?2, menu_label), \
             menu_icon = CASE WHEN ?3 THEN ?4 ELSE menu_icon END, \
             menu_url = CASE WHEN ?5 THEN ?6 ELSE menu_url END, \
             parent_id = CASE WHEN ?7 THEN ?8 ELSE parent_id END, \
             menu_order = COALESCE(?9, menu_order), \
             is_active = COALESCE(?10, is_active), \
             updated_by = ?11, updated_at = ?12 \
         WHERE id = ?13",
    )
    .bind(changes.menu_name)
    .bind(changes.menu_label)
    .bind(icon_set)
    .bind(icon)
    .bind(url_set)
    .bind(url)
    .bind(parent_set)
    .bind(parent_id)
    .bind(changes.menu_order)
    .bind(changes.is_active)
    .bind(operator_id)
    .bind(now)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected())
}

fn split_nullable<T>(value: Option<Option<T>>) -> (bool, Option<T>) {
    match value {
        Some(inner) => (true, inner),
        None => (false, None),
    }
}

/// Replace the declared permission set of a menu
pub async fn replace_permissions(
    conn: &mut SqliteConnection,
    menu_id: i64,
    permission_ids: &[i64],
    now: i64,
) -> RepoResult<()> {
    sqlx::query("DELETE FROM menu_permissions WHERE menu_id = ?")
        .bind(menu_id)
        .execute(&mut *conn)
        .await?;

    for permission_id in permission_ids {
        sqlx::query("INSERT INTO menu_permissions (menu_id, permission_id, created_at) VALUES (?, ?, ?)")
            .bind(menu_id)
            .bind(permission_id)
            .bind(now)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Replace every role grant of a menu with `can_access = 1` rows for `role_ids`
pub async fn replace_role_access(
    conn: &mut SqliteConnection,
    menu_id: i64,
    role_ids: &[i64],
    operator_id: i64,
    now: i64,
) -> RepoResult<()> {
    sqlx::query("DELETE FROM role_menu_access WHERE menu_id = ?")
        .bind(menu_id)
        .execute(&mut *conn)
        .await?;

    for role_id in role_ids {
        sqlx::query(
            "INSERT INTO role_menu_access (role_id, menu_id, can_access, created_by, updated_by, created_at, updated_at) \
             VALUES (?1, ?2, 1, ?3, ?3, ?4, ?4)",
        )
        .bind(role_id)
        .bind(menu_id)
        .bind(operator_id)
        .bind(now)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Remove a menu together with its permission links and role grants
pub async fn delete_with_associations(conn: &mut SqliteConnection, id: i64) -> RepoResult<u64> {
    sqlx::query("DELETE FROM menu_permissions WHERE menu_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM role_menu_access WHERE menu_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    let result = sqlx::query("DELETE FROM menus WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn find_access(
    conn: &mut SqliteConnection,
    role_id: i64,
    menu_id: i64,
) -> RepoResult<Option<RoleMenuAccess>> {
    let access = sqlx::query_as::<_, RoleMenuAccess>(&format!(
        "SELECT {ACCESS_COLUMNS} FROM role_menu_access WHERE role_id = ? AND menu_id = ?"
    ))
    .bind(role_id)
    .bind(menu_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(access)
}

pub async fn insert_access(
    conn: &mut SqliteConnection,
    role_id: i64,
    menu_id: i64,
    can_access: bool,
    operator_id: i64,
    now: i64,
) -> RepoResult<i64> {
    let result = sqlx::query(
        "INSERT INTO role_menu_access (role_id, menu_id, can_access, created_by, updated_by, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?4, ?5, ?5)",
    )
    .bind(role_id)
    .bind(menu_id)
    .bind(can_access)
    .bind(operator_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn update_access(
    conn: &mut SqliteConnection,
    id: i64,
    can_access: bool,
    operator_id: i64,
    now: i64,
) -> RepoResult<()> {
    sqlx::query("UPDATE role_menu_access SET can_access = ?, updated_by = ?, updated_at = ? WHERE id = ?")
        .bind(can_access)
        .bind(operator_id)
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn find_access_by_id(
    conn: &mut SqliteConnection,
    id: i64,
) -> RepoResult<Option<RoleMenuAccess>> {
    let access = sqlx::query_as::<_, RoleMenuAccess>(&format!(
        "SELECT {ACCESS_COLUMNS} FROM role_menu_access WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(access)
}
