//! Role Model

use super::permission::Permission;
use serde::{Deserialize, Serialize};

/// Role entity, a named bundle of permissions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Role {
    pub id: i64,
    pub role_name: String,
    pub description: Option<String>,
    /// Assigned automatically to newly created users
    pub is_default: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create role payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleCreate {
    #[serde(default)]
    pub role_name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    pub permission_ids: Option<Vec<i64>>,
}

/// Update role payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleUpdate {
    pub role_name: Option<String>,
    #[serde(default, deserialize_with = "crate::serde_helpers::double_option")]
    pub description: Option<Option<String>>,
    pub is_default: Option<bool>,
}

/// Replace-all body of `PUT /api/roles/{id}/permissions`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RolePermissionsUpdate {
    #[serde(default)]
    pub permission_ids: Vec<i64>,
}

/// Role with its granted permissions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleDetail {
    #[serde(flatten)]
    pub role: Role,
    pub permissions: Vec<Permission>,
}
