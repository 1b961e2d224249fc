//! Menu administration
//!
//! Validated, transactional mutations of the menu tree plus the admin read
//! models. Every check that can fail runs before the transaction opens; a
//! transaction that is dropped without commit rolls back.

use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    Menu, MenuCreate, MenuDetail, MenuListQuery, MenuListing, MenuUpdate, MenuWithRelations,
    RoleMenuAccessResult,
};
use shared::util::now_millis;
use sqlx::SqlitePool;

use crate::db::repository::menu::{self, MenuChanges, NewMenu};
use crate::db::repository::{IdTable, RepoError, role};
use crate::services::menu_hierarchy::{MAX_MENU_DEPTH, build_menu_hierarchy};
use crate::utils::validation::{
    MAX_ICON_LEN, MAX_LABEL_LEN, MAX_URL_LEN, dedup_ids, ensure_ids_exist, validate_ids,
    validate_nullable_text, validate_optional_text, validate_required_text, validate_slug,
};

fn menu_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::MenuNotFound, format!("Menu {id} not found"))
}

fn menu_name_taken(name: &str) -> AppError {
    AppError::field_error(
        ErrorCode::MenuNameExists,
        "menu_name",
        format!("Menu name '{name}' already exists"),
    )
}

fn menu_cycle(id: i64, parent_id: i64) -> AppError {
    AppError::field_error(
        ErrorCode::MenuCycleDetected,
        "parent_id",
        format!("Menu {id} cannot be placed under menu {parent_id}"),
    )
}

fn menu_too_deep(depth: usize) -> AppError {
    AppError::field_error(
        ErrorCode::MenuTooDeep,
        "parent_id",
        format!("Menu tree would be {depth} levels deep, max {MAX_MENU_DEPTH}"),
    )
    .with_detail("max_depth", MAX_MENU_DEPTH)
}

async fn ensure_parent_exists(pool: &SqlitePool, parent_id: i64) -> AppResult<()> {
    if menu::find_by_id(pool, parent_id).await?.is_none() {
        return Err(AppError::field_error(
            ErrorCode::MenuParentNotFound,
            "parent_id",
            format!("Parent menu {parent_id} not found"),
        ));
    }
    Ok(())
}

fn validate_create(data: &MenuCreate) -> AppResult<()> {
    validate_slug(&data.menu_name, "menu_name")?;
    validate_required_text(&data.menu_label, "menu_label", MAX_LABEL_LEN)?;
    validate_optional_text(&data.menu_icon, "menu_icon", MAX_ICON_LEN)?;
    validate_optional_text(&data.menu_url, "menu_url", MAX_URL_LEN)?;
    if let Some(parent_id) = data.parent_id {
        validate_ids(&[parent_id], "parent_id")?;
    }
    validate_ids(&data.permission_ids, "permission_ids")?;
    validate_ids(&data.role_ids, "role_ids")?;
    Ok(())
}

fn validate_update(data: &MenuUpdate) -> AppResult<()> {
    if let Some(name) = &data.menu_name {
        validate_slug(name, "menu_name")?;
    }
    if let Some(label) = &data.menu_label {
        validate_required_text(label, "menu_label", MAX_LABEL_LEN)?;
    }
    validate_nullable_text(&data.menu_icon, "menu_icon", MAX_ICON_LEN)?;
    validate_nullable_text(&data.menu_url, "menu_url", MAX_URL_LEN)?;
    if let Some(Some(parent_id)) = data.parent_id {
        validate_ids(&[parent_id], "parent_id")?;
    }
    if let Some(ids) = &data.permission_ids {
        validate_ids(ids, "permission_ids")?;
    }
    if let Some(ids) = &data.role_ids {
        validate_ids(ids, "role_ids")?;
    }
    Ok(())
}

/// Create a menu with its permission links and role grants
pub async fn create_menu(
    pool: &SqlitePool,
    operator_id: i64,
    data: MenuCreate,
) -> AppResult<MenuWithRelations> {
    validate_create(&data)?;

    if menu::find_by_name(pool, &data.menu_name).await?.is_some() {
        return Err(menu_name_taken(&data.menu_name));
    }
    if let Some(parent_id) = data.parent_id {
        ensure_parent_exists(pool, parent_id).await?;
        let depth = menu::find_ancestor_ids(pool, parent_id).await?.len() + 2;
        if depth > MAX_MENU_DEPTH {
            return Err(menu_too_deep(depth));
        }
    }

    let permission_ids = dedup_ids(&data.permission_ids);
    let role_ids = dedup_ids(&data.role_ids);
    ensure_ids_exist(pool, IdTable::Permissions, &permission_ids, "permission_ids").await?;
    ensure_ids_exist(pool, IdTable::Roles, &role_ids, "role_ids").await?;

    let new_menu = NewMenu {
        menu_name: &data.menu_name,
        menu_label: &data.menu_label,
        menu_icon: data.menu_icon.as_deref(),
        menu_url: data.menu_url.as_deref(),
        parent_id: data.parent_id,
        menu_order: data.menu_order,
        is_active: data.is_active,
    };

    let now = now_millis();
    let mut tx = pool.begin().await.map_err(RepoError::from)?;

    let id = match menu::insert(&mut *tx, &new_menu, operator_id, now).await {
        Ok(id) => id,
        Err(RepoError::Duplicate(_)) => return Err(menu_name_taken(&data.menu_name)),
        Err(e) => return Err(e.into()),
    };
    menu::replace_permissions(&mut *tx, id, &permission_ids, now).await?;
    menu::replace_role_access(&mut *tx, id, &role_ids, operator_id, now).await?;

    tx.commit().await.map_err(RepoError::from)?;

    tracing::info!(
        menu_id = id,
        menu_name = %data.menu_name,
        operator_id,
        permissions = permission_ids.len(),
        roles = role_ids.len(),
        "Menu created"
    );

    get_menu_by_id(pool, id).await
}

/// Partially update a menu
///
/// Supplied `permission_ids` / `role_ids` replace the stored sets.
pub async fn update_menu(
    pool: &SqlitePool,
    operator_id: i64,
    id: i64,
    data: MenuUpdate,
) -> AppResult<MenuWithRelations> {
    let existing = menu::find_by_id(pool, id)
        .await?
        .ok_or_else(|| menu_not_found(id))?;

    validate_update(&data)?;

    if let Some(name) = &data.menu_name
        && *name != existing.menu_name
        && let Some(other) = menu::find_by_name(pool, name).await?
        && other.id != id
    {
        return Err(menu_name_taken(name));
    }

    if let Some(Some(parent_id)) = data.parent_id {
        if parent_id == id {
            return Err(menu_cycle(id, parent_id));
        }
        ensure_parent_exists(pool, parent_id).await?;
        let ancestors = menu::find_ancestor_ids(pool, parent_id).await?;
        if ancestors.contains(&id) {
            return Err(menu_cycle(id, parent_id));
        }

        // Depth of the parent plus every level of the subtree that moves with the menu
        let height = menu::find_subtree_height(pool, id, MAX_MENU_DEPTH as i64 + 1).await?;
        let depth = ancestors.len() + 1 + usize::try_from(height).unwrap_or(MAX_MENU_DEPTH);
        if depth > MAX_MENU_DEPTH {
            return Err(menu_too_deep(depth));
        }
    }

    let permission_ids = data.permission_ids.as_deref().map(dedup_ids);
    let role_ids = data.role_ids.as_deref().map(dedup_ids);
    if let Some(ids) = &permission_ids {
        ensure_ids_exist(pool, IdTable::Permissions, ids, "permission_ids").await?;
    }
    if let Some(ids) = &role_ids {
        ensure_ids_exist(pool, IdTable::Roles, ids, "role_ids").await?;
    }

    let changes = MenuChanges {
        menu_name: data.menu_name.as_deref(),
        menu_label: data.menu_label.as_deref(),
        menu_icon: data.menu_icon.as_ref().map(|v| v.as_deref()),
        menu_url: data.menu_url.as_ref().map(|v| v.as_deref()),
        parent_id: data.parent_id,
        menu_order: data.menu_order,
        is_active: data.is_active,
    };

    let now = now_millis();
    let mut tx = pool.begin().await.map_err(RepoError::from)?;

    let touched = match menu::update_fields(&mut *tx, id, &changes, operator_id, now).await {
        Ok(n) => n,
        Err(RepoError::Duplicate(_)) => {
            return Err(menu_name_taken(data.menu_name.as_deref().unwrap_or_default()));
        }
        Err(e) => return Err(e.into()),
    };
    if touched == 0 {
        return Err(menu_not_found(id));
    }
    if let Some(ids) = &permission_ids {
        menu::replace_permissions(&mut *tx, id, ids, now).await?;
    }
    if let Some(ids) = &role_ids {
        menu::replace_role_access(&mut *tx, id, ids, operator_id, now).await?;
    }

    tx.commit().await.map_err(RepoError::from)?;

    tracing::info!(
        menu_id = id,
        operator_id,
        permissions_replaced = permission_ids.is_some(),
        roles_replaced = role_ids.is_some(),
        "Menu updated"
    );

    get_menu_by_id(pool, id).await
}

/// Delete a leaf menu with its permission links and role grants
pub async fn delete_menu(pool: &SqlitePool, operator_id: i64, id: i64) -> AppResult<()> {
    menu::find_by_id(pool, id)
        .await?
        .ok_or_else(|| menu_not_found(id))?;

    let child_count = menu::count_children(pool, id).await?;
    if child_count > 0 {
        return Err(has_children(id, child_count));
    }

    let mut tx = pool.begin().await.map_err(RepoError::from)?;
    match menu::delete_with_associations(&mut *tx, id).await {
        Ok(0) => return Err(menu_not_found(id)),
        Ok(_) => {}
        // A child was attached after the count check
        Err(RepoError::Reference(_)) => {
            return Err(AppError::new(ErrorCode::MenuHasChildren));
        }
        Err(e) => return Err(e.into()),
    }
    tx.commit().await.map_err(RepoError::from)?;

    tracing::info!(menu_id = id, operator_id, "Menu deleted");
    Ok(())
}

fn has_children(id: i64, child_count: i64) -> AppError {
    AppError::with_message(
        ErrorCode::MenuHasChildren,
        format!("Menu {id} has {child_count} child menu(s); delete or move them first"),
    )
    .with_detail("child_count", child_count)
}

/// Insert or update the `(role_id, menu_id)` grant
///
/// `created` in the result is true only when a new row was inserted.
pub async fn update_role_menu_access(
    pool: &SqlitePool,
    operator_id: i64,
    role_id: i64,
    menu_id: i64,
    can_access: Option<bool>,
) -> AppResult<RoleMenuAccessResult> {
    let can_access = can_access
        .ok_or_else(|| AppError::invalid_field("can_access", "can_access must be a boolean"))?;

    if role::find_by_id(pool, role_id).await?.is_none() {
        return Err(AppError::with_message(
            ErrorCode::RoleNotFound,
            format!("Role {role_id} not found"),
        ));
    }
    if menu::find_by_id(pool, menu_id).await?.is_none() {
        return Err(menu_not_found(menu_id));
    }

    let now = now_millis();
    let mut tx = pool.begin().await.map_err(RepoError::from)?;

    let (access_id, created) = match menu::find_access(&mut *tx, role_id, menu_id).await? {
        Some(existing) => {
            menu::update_access(&mut *tx, existing.id, can_access, operator_id, now).await?;
            (existing.id, false)
        }
        None => {
            let id =
                menu::insert_access(&mut *tx, role_id, menu_id, can_access, operator_id, now)
                    .await?;
            (id, true)
        }
    };
    let access = menu::find_access_by_id(&mut *tx, access_id)
        .await?
        .ok_or_else(|| AppError::internal("Role menu access vanished inside its transaction"))?;

    tx.commit().await.map_err(RepoError::from)?;

    tracing::info!(role_id, menu_id, can_access, created, operator_id, "Role menu access saved");
    Ok(RoleMenuAccessResult { access, created })
}

/// Every menu, active or not, as both a tree and a flat ordered list
pub async fn get_all_menus(pool: &SqlitePool, query: MenuListQuery) -> AppResult<MenuListing> {
    let menus = menu::find_all(pool).await?;

    let mut permissions = if query.include_permissions {
        Some(menu::find_permissions_by_menu(pool).await?)
    } else {
        None
    };
    let mut roles = if query.include_roles {
        Some(menu::find_role_access_by_menu(pool).await?)
    } else {
        None
    };

    let flat: Vec<MenuDetail> = menus
        .into_iter()
        .map(|menu: Menu| MenuDetail {
            permissions: permissions
                .as_mut()
                .map(|by_menu| by_menu.remove(&menu.id).unwrap_or_default()),
            roles: roles
                .as_mut()
                .map(|by_menu| by_menu.remove(&menu.id).unwrap_or_default()),
            menu,
        })
        .collect();

    let hierarchy = build_menu_hierarchy(flat.clone());
    Ok(MenuListing { hierarchy, flat })
}

/// One menu with parent, ordered children, permissions and role grants
pub async fn get_menu_by_id(pool: &SqlitePool, id: i64) -> AppResult<MenuWithRelations> {
    let menu = menu::find_by_id(pool, id)
        .await?
        .ok_or_else(|| menu_not_found(id))?;

    let parent = match menu.parent_id {
        Some(parent_id) => menu::find_by_id(pool, parent_id).await?,
        None => None,
    };
    let children = menu::find_children(pool, id).await?;
    let permissions = menu::find_permissions(pool, id).await?;
    let roles = menu::find_role_access(pool, id).await?;

    Ok(MenuWithRelations {
        menu,
        parent,
        children,
        permissions,
        roles,
    })
}
