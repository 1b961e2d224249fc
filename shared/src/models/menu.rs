//! Menu Model
//!
//! Menus form a self-referencing tree through `parent_id`. Visibility is gated by
//! `menu_permissions` (any-of) and `role_menu_access` (explicit per-role grants).

use super::permission::Permission;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// Menu entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Menu {
    pub id: i64,
    /// Unique slug
    pub menu_name: String,
    pub menu_label: String,
    pub menu_icon: Option<String>,
    pub menu_url: Option<String>,
    pub parent_id: Option<i64>,
    /// Sort key among siblings
    pub menu_order: i32,
    pub is_active: bool,
    pub created_by: Option<i64>,
    pub updated_by: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create menu payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuCreate {
    #[serde(default)]
    pub menu_name: String,
    #[serde(default)]
    pub menu_label: String,
    pub menu_icon: Option<String>,
    pub menu_url: Option<String>,
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub menu_order: i32,
    #[serde(
        default = "default_true",
        deserialize_with = "crate::serde_helpers::bool_true"
    )]
    pub is_active: bool,
    /// Any of these permissions unlocks the menu
    #[serde(default)]
    pub permission_ids: Vec<i64>,
    /// Roles granted explicit access (`can_access = true`)
    #[serde(default)]
    pub role_ids: Vec<i64>,
}

/// Update menu payload
///
/// Omitted fields keep their stored value. `menu_icon`, `menu_url` and `parent_id`
/// accept an explicit `null` to clear them. Supplying `permission_ids` or `role_ids`
/// replaces the whole association set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuUpdate {
    pub menu_name: Option<String>,
    pub menu_label: Option<String>,
    #[serde(default, deserialize_with = "crate::serde_helpers::double_option")]
    pub menu_icon: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::serde_helpers::double_option")]
    pub menu_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::serde_helpers::double_option")]
    pub parent_id: Option<Option<i64>>,
    pub menu_order: Option<i32>,
    pub is_active: Option<bool>,
    pub permission_ids: Option<Vec<i64>>,
    pub role_ids: Option<Vec<i64>>,
}

/// Role grant on a menu, joined with the role name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct MenuRoleAccess {
    pub role_id: i64,
    pub role_name: String,
    pub can_access: bool,
}

/// Explicit per-role allow/deny row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct RoleMenuAccess {
    pub id: i64,
    pub role_id: i64,
    pub menu_id: i64,
    pub can_access: bool,
    pub created_by: Option<i64>,
    pub updated_by: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Body of `PUT /api/menus/roles/{role_id}/menus/{menu_id}/access`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleMenuAccessUpdate {
    pub can_access: Option<bool>,
}

/// Upsert outcome; `created` is true only when a new row was inserted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleMenuAccessResult {
    #[serde(flatten)]
    pub access: RoleMenuAccess,
    pub created: bool,
}

/// Menu row for the admin listing, with optionally loaded associations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuDetail {
    #[serde(flatten)]
    pub menu: Menu,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<Permission>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<MenuRoleAccess>>,
}

/// Single menu with its neighbourhood and associations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuWithRelations {
    #[serde(flatten)]
    pub menu: Menu,
    pub parent: Option<Menu>,
    pub children: Vec<Menu>,
    pub permissions: Vec<Permission>,
    pub roles: Vec<MenuRoleAccess>,
}

/// Admin listing: the tree plus the flat ordered list it was built from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuListing {
    pub hierarchy: Vec<MenuNode<MenuDetail>>,
    pub flat: Vec<MenuDetail>,
}

/// Query string of `GET /api/menus`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MenuListQuery {
    #[serde(default)]
    pub include_permissions: bool,
    #[serde(default)]
    pub include_roles: bool,
}

/// Anything the hierarchy builder can arrange into a tree
pub trait MenuTreeItem {
    fn id(&self) -> i64;
    fn parent_id(&self) -> Option<i64>;
    fn menu_order(&self) -> i32;
}

impl MenuTreeItem for Menu {
    fn id(&self) -> i64 {
        self.id
    }

    fn parent_id(&self) -> Option<i64> {
        self.parent_id
    }

    fn menu_order(&self) -> i32 {
        self.menu_order
    }
}

impl MenuTreeItem for MenuDetail {
    fn id(&self) -> i64 {
        self.menu.id
    }

    fn parent_id(&self) -> Option<i64> {
        self.menu.parent_id
    }

    fn menu_order(&self) -> i32 {
        self.menu.menu_order
    }
}

/// One node of the nested menu tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuNode<T> {
    #[serde(flatten)]
    pub item: T,
    pub children: Vec<MenuNode<T>>,
}

impl<T> MenuNode<T> {
    pub fn leaf(item: T) -> Self {
        Self {
            item,
            children: Vec::new(),
        }
    }
}
