//! Menu access resolution
//!
//! Decides which active menus a user may see and returns them as a tree.
//!
//! A menu is visible when:
//! - it declares permissions and the user holds at least one of them, or
//! - it declares none and one of the user's roles has a `can_access` grant.
//!
//! Role grants are not consulted for menus that declare permissions.

use shared::error::AppResult;
use shared::models::{Menu, MenuNode};
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};

use crate::db::repository::{RepoResult, menu, permission, role};
use crate::services::menu_hierarchy::build_menu_hierarchy;

/// An active menu with the data its visibility depends on
#[derive(Debug, Clone)]
pub struct MenuGrants {
    pub menu: Menu,
    /// Every permission declared on the menu, active or not
    pub required_permission_ids: Vec<i64>,
    /// The caller's roles holding a `can_access` grant on the menu
    pub granted_role_ids: Vec<i64>,
}

/// Data needed to resolve a user's menus
#[allow(async_fn_in_trait)]
pub trait AccessSource {
    /// Role ids assigned to the user
    async fn user_roles(&self, user_id: i64) -> RepoResult<Vec<i64>>;

    /// Active permission ids granted to any of `role_ids`
    async fn role_permission_ids(&self, role_ids: &[i64]) -> RepoResult<HashSet<i64>>;

    /// Active menus with declared permissions and the grants held by `role_ids`
    async fn active_menu_grants(&self, role_ids: &[i64]) -> RepoResult<Vec<MenuGrants>>;
}

impl AccessSource for SqlitePool {
    async fn user_roles(&self, user_id: i64) -> RepoResult<Vec<i64>> {
        let roles = role::find_by_user(self, user_id).await?;
        Ok(roles.into_iter().map(|r| r.id).collect())
    }

    async fn role_permission_ids(&self, role_ids: &[i64]) -> RepoResult<HashSet<i64>> {
        let ids = permission::find_active_ids_by_roles(self, role_ids).await?;
        Ok(ids.into_iter().collect())
    }

    async fn active_menu_grants(&self, role_ids: &[i64]) -> RepoResult<Vec<MenuGrants>> {
        let menus = menu::find_active(self).await?;

        let mut required: HashMap<i64, Vec<i64>> = HashMap::new();
        for (menu_id, permission_id) in menu::find_active_permission_links(self).await? {
            required.entry(menu_id).or_default().push(permission_id);
        }

        let mut granted: HashMap<i64, Vec<i64>> = HashMap::new();
        for (menu_id, role_id) in menu::find_granted_links(self, role_ids).await? {
            granted.entry(menu_id).or_default().push(role_id);
        }

        Ok(menus
            .into_iter()
            .map(|menu| MenuGrants {
                required_permission_ids: required.remove(&menu.id).unwrap_or_default(),
                granted_role_ids: granted.remove(&menu.id).unwrap_or_default(),
                menu,
            })
            .collect())
    }
}

/// Visibility predicate for one menu
pub fn is_authorized(grants: &MenuGrants, user_permissions: &HashSet<i64>) -> bool {
    if grants.required_permission_ids.is_empty() {
        !grants.granted_role_ids.is_empty()
    } else {
        grants
            .required_permission_ids
            .iter()
            .any(|id| user_permissions.contains(id))
    }
}

/// Menu tree visible to `user_id`
///
/// A user without roles gets an empty tree.
pub async fn get_user_menus<S: AccessSource>(
    source: &S,
    user_id: i64,
) -> AppResult<Vec<MenuNode<Menu>>> {
    let role_ids = source.user_roles(user_id).await?;
    if role_ids.is_empty() {
        tracing::debug!(user_id, "User has no roles, no menus visible");
        return Ok(Vec::new());
    }

    let user_permissions = source.role_permission_ids(&role_ids).await?;
    let candidates = source.active_menu_grants(&role_ids).await?;
    let total = candidates.len();

    let visible: Vec<Menu> = candidates
        .into_iter()
        .filter(|grants| is_authorized(grants, &user_permissions))
        .map(|grants| grants.menu)
        .collect();

    tracing::debug!(
        user_id,
        roles = role_ids.len(),
        permissions = user_permissions.len(),
        visible = visible.len(),
        total,
        "Resolved user menus"
    );

    Ok(build_menu_hierarchy(visible))
}
